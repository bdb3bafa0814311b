use std::error::Error;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use pretty_hex::pretty_hex;
use x509compat::{
    cert::{
        ext::{
            constraints::BasicConstraints,
            crl::{DistributionPoint, DistributionPoints},
            name::GeneralName,
            AccessDescription, AltName, InfoAccess,
        },
        name::Name,
    },
    BigNum, Certificate, PKey,
};

const EXTENSIONS: [&str; 5] = [
    "subjectAltName",
    "issuerAltName",
    "basicConstraints",
    "authorityInfoAccess",
    "crlDistributionPoints",
];

fn command_inspect(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let path = args
        .get_one::<String>("file")
        .ok_or("certificate file is required")?;
    let digest = args.get_one::<String>("digest").map(String::as_str);

    let cert = Certificate::from_pem(std::fs::read(path)?)?;
    println!("{}", cert);
    println!();
    println!(
        "Fingerprint: {}",
        x509compat::utils::to_colon_hex(&cert.digest(digest)?)
    );
    println!(
        "Public key fingerprint: {}",
        x509compat::utils::to_colon_hex(&cert.pubkey_digest(digest)?)
    );

    for url in cert.ocsp_urls()? {
        println!("OCSP: {}", url);
    }
    for url in cert.crl_urls()? {
        println!("CRL:  {}", url);
    }

    if args.get_flag("dump") {
        for id in EXTENSIONS {
            let mut last_pos = None;
            while let Some((record, pos)) = cert.get_extension(id, last_pos)? {
                println!();
                println!("{} (#{}):", record.name(), pos);
                println!("{}", pretty_hex(&record.value()));
                last_pos = Some(pos);
            }
        }
    }

    Ok(())
}

fn command_selfsign(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let cn = args.get_one::<String>("cn").ok_or("--cn is required")?;
    let days = *args.get_one::<u32>("days").unwrap_or(&365);

    let key = match args.get_one::<usize>("bits") {
        Some(bits) => PKey::generate_rsa(*bits)?,
        None => PKey::generate()?,
    };

    let mut name = Name::new();
    name.add("CN", cn)?;

    let mut cert = Certificate::new()?;
    let (not_before, _) = cert.lifetime()?;
    cert.set_serial_number(&BigNum::from(rand::random::<u32>() as u64))?;
    cert.set_lifetime(None, Some(not_before + i64::from(days) * 86400))?;
    cert.set_subject_name(&name)?;
    cert.set_issuer_name(&name)?;
    cert.set_pubkey(&key)?;

    if args.get_flag("ca") {
        cert.set_basic_constraints(&BasicConstraints::new(true, None))?;
        cert.set_extension_critical("basicConstraints", true)?;
    }

    if let Some(sans) = args.get_many::<String>("san") {
        let names = sans
            .map(|san| san.parse::<GeneralName>())
            .collect::<Result<AltName, _>>()?;
        cert.set_subject_alt_name(&names)?;
    }

    if let Some(url) = args.get_one::<String>("ocsp") {
        let access: InfoAccess = [AccessDescription::ocsp(url)].into_iter().collect();
        cert.set_info_access(&access)?;
    }

    if let Some(url) = args.get_one::<String>("crl") {
        let points: DistributionPoints = [DistributionPoint::from_uri(url)].into_iter().collect();
        cert.set_crl_distribution_points(&points)?;
    }

    cert.sign(&key, None)?;

    if let Some(path) = args.get_one::<String>("key-out") {
        std::fs::write(path, key.private_key_to_pem()?)?;
    }
    print!("{}", cert.to_pem()?);

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let app = Command::new("x509compat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and build X.509 certificates")
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase logging verbosity. Can be specified multiple times."),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the fields and extensions of a PEM certificate")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .help("Path of the PEM certificate"),
                )
                .arg(
                    Arg::new("digest")
                        .long("digest")
                        .help("Fingerprint digest (sha1, sha224, sha256, sha384, sha512)"),
                )
                .arg(
                    Arg::new("dump")
                        .long("dump")
                        .action(ArgAction::SetTrue)
                        .help("Hex dump the known extension values"),
                ),
        )
        .subcommand(
            Command::new("selfsign")
                .about("Generate a key and a self-signed certificate")
                .arg(Arg::new("cn").long("cn").required(true).help("Common name"))
                .arg(
                    Arg::new("days")
                        .long("days")
                        .value_parser(value_parser!(u32))
                        .help("Validity period in days [default: 365]"),
                )
                .arg(
                    Arg::new("bits")
                        .long("bits")
                        .value_parser(value_parser!(usize))
                        .help("RSA key size"),
                )
                .arg(
                    Arg::new("ca")
                        .long("ca")
                        .action(ArgAction::SetTrue)
                        .help("Mark the certificate as a CA"),
                )
                .arg(
                    Arg::new("san")
                        .long("san")
                        .action(ArgAction::Append)
                        .help("Subject alternative name, e.g. DNS:example.com"),
                )
                .arg(Arg::new("ocsp").long("ocsp").help("OCSP responder URL"))
                .arg(Arg::new("crl").long("crl").help("CRL distribution point URL"))
                .arg(
                    Arg::new("key-out")
                        .long("key-out")
                        .help("Write the private key PEM to this path"),
                ),
        );

    let matches = app.get_matches();

    let log_level = match matches.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );
    if log_level <= LevelFilter::Warn {
        builder
            .format_timestamp(None)
            .format_target(false);
    }
    builder.init();

    match matches.subcommand() {
        Some(("inspect", args)) => command_inspect(args),
        Some(("selfsign", args)) => command_selfsign(args),
        _ => Err("invalid sub-command".into()),
    }
}
