use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::ValueParser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub fn validator_is_num() -> ValueParser {
    ValueParser::from(move |s: &str| -> std::result::Result<usize, String> {
        s.parse::<usize>()
            .map_err(|_| String::from("Not a valid number"))
    })
}

pub fn validator_is_file() -> ValueParser {
    ValueParser::from(move |s: &str| -> std::result::Result<PathBuf, String> {
        if let Ok(metadata) = fs::metadata(s) {
            if metadata.is_file() {
                return Ok(PathBuf::from(s));
            }
        }

        Err(format!("Invalid file path or file does not exist: '{s}'"))
    })
}

pub fn new(config_path: &Path) -> Command {
    // get config file path (default: ~/.config/s3up/config.yml)
    let config_file_path = config_path.join("config.yml");

    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let num_uploads = num_cpus::get_physical().clamp(1, usize::from(u8::MAX)).to_string();

    Command::new("s3up")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Multipart uploads to S3, requests are signed by a remote signing authority")
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("config")
            .default_value(config_file_path.into_os_string())
            .help("config.yml")
            .long("config")
            .short('c')
            .num_args(1)
            .value_name("config.yml")
            .value_parser(validator_is_file())
        )
        .arg(
            Arg::new("host")
            .default_value("s3")
            .help("Host entry in the config file")
            .long("host")
            .num_args(1)
        )
        .arg(
            Arg::new("prefix")
            .help("Key prefix, overrides the one in the config file")
            .long("prefix")
            .short('p')
            .num_args(1)
        )
        .arg(
            Arg::new("buffer")
            .help("Default part size in bytes, minimum 5242880")
            .long("buffer")
            .short('b')
            .num_args(1)
            .value_parser(validator_is_num())
        )
        .arg(
            Arg::new("retries")
            .default_value("3")
            .help("Number of attempts per request")
            .long("retries")
            .short('r')
            .num_args(1)
            .value_parser(validator_is_num())
        )
        .arg(
            Arg::new("number")
            .default_value(num_uploads)
            .help("Number of files uploaded at the same time")
            .long("number")
            .short('n')
            .num_args(1)
            .value_parser(clap::value_parser!(u8).range(1..=255))
        )
        .arg(
            Arg::new("content-type")
            .help("Content type of the uploaded files")
            .long("content-type")
            .short('t')
            .num_args(1)
        )
        .arg(
            Arg::new("acl")
            .help("The canned ACL to apply to the objects")
            .long("acl")
            .value_parser([
                "private",
                "public-read",
                "public-read-write",
                "authenticated-read",
                "bucket-owner-read",
                "bucket-owner-full-control",
            ])
            .short('a')
            .num_args(1)
        )
        .arg(
            Arg::new("verbose")
            .help("Verbosity level")
            .long("verbose")
            .short('v')
            .action(ArgAction::Count)
        )
        .arg(
            Arg::new("files")
            .help("Files to upload")
            .required(true)
            .num_args(1..)
            .value_parser(validator_is_file())
        )
}
