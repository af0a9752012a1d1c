use crc32fast::Hasher;

/// Derive a short stable session id from a seed string using CRC32
pub fn get_session_id(seed: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(seed.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for shapes minted by one editing session
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(seed: &str) -> Self {
        Self {
            seed: get_session_id(seed),
            count: 0,
        }
    }

    /// Next id, prefixed with `prefix` (e.g. "clear")
    pub fn new_id(&mut self, prefix: &str) -> String {
        self.count += 1;
        format!("{}-{}-{}", prefix, self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
