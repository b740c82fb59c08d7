pub mod constants;
pub mod test_helpers;
