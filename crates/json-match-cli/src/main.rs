use std::process;

fn main() {
    match json_match_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("json-match error: {err:#}");
            process::exit(json_match_cli::ExitCode::Io as i32);
        }
    }
}
