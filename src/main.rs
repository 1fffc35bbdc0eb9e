fn main() {
    match paramlint::cli::run() {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            paramlint::ui::eprintln_error(&err);
            std::process::exit(paramlint::exit::exit_code(&err));
        }
    }
}
