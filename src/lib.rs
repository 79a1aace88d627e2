pub mod cli;
pub mod config;
pub mod git;
pub mod path;
pub mod scan;
pub mod shell_exec;
pub mod styling;
