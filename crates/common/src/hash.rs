//! Content addressing helpers.

use blake2::{digest::typenum::U32, Blake2b, Digest};

/// 32-byte blake2b digest.
pub fn blake2(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hex-encoded blake2 digest, used as a content address.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(blake2(data))
}

/// Count of `\n` bytes in the provided data.
pub fn line_count(data: &[u8]) -> usize {
    data.iter().filter(|&&byte| byte == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::{content_hash, line_count};

    #[test]
    fn hash_is_stable_hex() {
        let hash = content_hash(b"int main() {}\n");

        assert_eq!(hash.len(), 64);
        assert_eq!(hash, content_hash(b"int main() {}\n"));
        assert_ne!(hash, content_hash(b"int main() {}"));
    }

    #[test]
    fn counts_newline_bytes() {
        assert_eq!(line_count(b""), 0);
        assert_eq!(line_count(b"ab"), 0);
        assert_eq!(line_count(b"a\nb\n"), 2);
        assert_eq!(line_count(b"\n\n\n"), 3);
    }
}
