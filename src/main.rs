use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;

use translit_compiler::config::CompilerConfig;

#[derive(FromArgs)]
/// Compiles CLDR LDML transform rules into a flat rule table.
struct Args {
    /// directory containing the CLDR transforms XML files
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// directory to write transliteration_data.bin and
    /// transliteration_scripts.bin into
    #[argh(positional)]
    output: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = CompilerConfig::new();
    match translit_compiler::compile(&args.input, &args.output, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
