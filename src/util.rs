use rand::distr::{Alphanumeric, Distribution};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Returns a random alphanumeric string of the given length.
pub fn random_alphanumeric_string(len: usize) -> String {
    let mut rng = StdRng::from_os_rng();
    String::from_iter((0..len).map(|_| Alphanumeric.sample(&mut rng) as char))
}

/// Strips path separators and other surprising characters from a client-supplied
/// file name, leaving something safe to join onto the upload directory.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("notes v2.pdf"), "notes_v2.pdf");
    }

    #[test]
    fn random_string_has_requested_length() {
        assert_eq!(random_alphanumeric_string(64).len(), 64);
    }
}
