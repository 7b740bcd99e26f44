/// Root folder of the blockchain fixtures inside the fixtures repository.
pub const ROOT: &str = "BlockchainTests";

/// Extension of the fixture files.
pub const FIXTURE_EXTENSION: &str = "json";
