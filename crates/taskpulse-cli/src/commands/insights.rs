use std::path::Path;

use super::{open_engine, print_json, CliResult};

pub fn run(tasks: Option<&Path>) -> CliResult {
    let engine = open_engine(tasks)?;
    print_json(&engine.patterns())
}
