use rand::Rng;
use rand::distr::Alphanumeric;

pub const ID_LEN: usize = 29;

/// Random `[A-Za-z0-9]{29}` suffix for completion and tool-call ids.
pub fn generate_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}
