pub fn to_hex_str<T>(bytes: &T) -> String
where
    T: AsRef<[u8]> + ?Sized,
{
    let x = bytes.as_ref();

    x.iter()
        .map(|v| format!("{:02x}", v))
        .collect::<Vec<String>>()
        .join("")
}

/// Colon separated hex, the way certificate dumps print fingerprints.
pub fn to_colon_hex<T>(bytes: &T) -> String
where
    T: AsRef<[u8]> + ?Sized,
{
    bytes
        .as_ref()
        .iter()
        .map(|v| format!("{:02X}", v))
        .collect::<Vec<String>>()
        .join(":")
}

pub trait IndentString {
    fn indent(self: &Self, width: usize) -> String;
}

impl<T> IndentString for T
where
    T: AsRef<str> + ?Sized,
{
    fn indent(self: &Self, width: usize) -> String {
        let pad = " ".repeat(width);

        self.as_ref()
            .lines()
            .map(|line| format!("{}{}", pad, line))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_helpers() {
        assert_eq!(to_hex_str(&[0x0a, 0xff]), "0aff");
        assert_eq!(to_colon_hex(&[0x0a, 0xff]), "0A:FF");
    }

    #[test]
    fn indent_every_line() {
        assert_eq!("a\nb".indent(2), "  a\n  b");
    }
}
