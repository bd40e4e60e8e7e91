pub mod cli_detect;
pub mod git;
pub mod linear;
