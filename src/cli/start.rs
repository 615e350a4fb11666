use crate::{
    cli::{Config, commands, globals::GlobalArgs},
    s3::limits::{MAX_PART_SIZE_BYTES, MIN_PART_SIZE_BYTES},
    upload::Coordinator,
};
use anyhow::{Context, Result, anyhow};
use bytesize::ByteSize;
use clap::ArgMatches;
use colored::Colorize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// What to upload once the coordinator is ready
#[derive(Debug)]
pub struct UploadArgs {
    pub files: Vec<PathBuf>,
    pub content_type: Option<String>,
}

/// # Errors
///
/// Will return `Err` if the config directory can not be created
pub fn get_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().map_or_else(|| PathBuf::from("/tmp"), |h| h);

    let config_path = Path::new(&home_dir).join(".config").join("s3up");
    fs::create_dir_all(&config_path)
        .context(format!("unable to create: {}", &config_path.display()))?;

    Ok(config_path)
}

/// # Errors
///
/// Will return `Err` if the config file can not be loaded or the host is not
/// defined
pub fn start() -> Result<(Coordinator, UploadArgs)> {
    let config_path = get_config_path()?;

    // start the command line interface
    let matches = commands::new(&config_path).get_matches();

    let verbosity_level = match matches.get_count("verbose") {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(verbosity_level)
        .init();

    log::info!("config path: {}", config_path.display());

    setup(&matches)
}

fn setup(matches: &ArgMatches) -> Result<(Coordinator, UploadArgs)> {
    let config_file = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .context("no config file found")?;

    // load the config file
    let config = Config::new(config_file.clone())?;

    log::debug!("config: {config:#?}");

    let host_name = matches
        .get_one::<String>("host")
        .map_or("s3", String::as_str);

    let host = config.get_host(host_name).map_err(|_| {
        anyhow!(
            "Could not find host: \"{}\". Check config file {}, For more information try {}",
            host_name.red(),
            config_file.display(),
            "--help".green()
        )
    })?;

    let prefix = matches.get_one::<String>("prefix").map(String::as_str);

    let mut s3 = host.s3(prefix)?;

    // --acl overrides the host acl
    if let Some(acl) = matches.get_one::<String>("acl") {
        s3 = s3.with_acl(Some(acl.to_string()));
    }

    // define part size
    let mut part_size: u64 = matches
        .get_one::<usize>("buffer")
        .map(|size| *size as u64)
        .or(host.part_size)
        .unwrap_or(MIN_PART_SIZE_BYTES);

    if part_size < MIN_PART_SIZE_BYTES {
        log::warn!(
            "part size {} is below the minimum, using {}",
            ByteSize::b(part_size),
            ByteSize::b(MIN_PART_SIZE_BYTES)
        );
        part_size = MIN_PART_SIZE_BYTES;
    }

    if part_size > MAX_PART_SIZE_BYTES {
        return Err(anyhow!(
            "part size {} exceeds the maximum of {}",
            ByteSize::b(part_size),
            ByteSize::b(MAX_PART_SIZE_BYTES)
        ));
    }

    log::info!("part size: {}", ByteSize::b(part_size));

    // define global args
    let mut global_args = GlobalArgs::new();

    let retries: usize = matches.get_one::<usize>("retries").map_or(3, |n| *n);
    global_args.set_retries(retries);

    if let Some(number) = matches.get_one::<u8>("number") {
        global_args.set_max_uploads(usize::from(*number));
    }

    log::debug!("globals: {global_args:#?}");

    let upload_args = UploadArgs {
        files: matches
            .get_many::<PathBuf>("files")
            .map(|files| files.cloned().collect())
            .unwrap_or_default(),
        content_type: matches.get_one::<String>("content-type").cloned(),
    };

    Ok((Coordinator::new(s3, part_size, &global_args), upload_args))
}
