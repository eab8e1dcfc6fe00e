use clap::{
    crate_description, crate_name, crate_version, App, AppSettings, Arg, SubCommand,
};
use wpress::{create, extract, list, verify, Termination};

fn main() -> anyhow::Result<()> {
    let arg_archive = Arg::with_name("archive")
        .help("Archive file")
        .required(true)
        .value_name("FILE");

    let arg_dir = Arg::with_name("dir")
        .help("Directory to extract to or archive from (defaults to '.')")
        .required(true)
        .value_name("DIR")
        .default_value(".");

    let matches = App::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("extract")
                .about("Extract archive")
                .arg(&arg_archive)
                .arg(&arg_dir),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List archive")
                .arg(&arg_archive)
                .arg(
                    Arg::with_name("verbose")
                        .help("Show entry sizes and timestamps")
                        .short("v")
                        .long("verbose"),
                ),
        )
        .subcommand(
            SubCommand::with_name("verify")
                .about("Verify archive structure")
                .arg(&arg_archive),
        )
        .subcommand(
            SubCommand::with_name("create")
                .about("Create archive from a directory")
                .arg(&arg_archive)
                .arg(&arg_dir),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("extract") {
        let summary = extract(
            matches.value_of("archive").unwrap(),
            matches.value_of("dir").unwrap(),
        )?;
        println!("Files extracted: {}", summary.file_count);
        println!(
            "Total size: {:.2} MiB",
            summary.total_bytes as f64 / (1024.0 * 1024.0)
        );
        println!("Output directory: {}", summary.output_dir.display());

        match summary.termination {
            Termination::TruncatedPayload {
                entry,
                expected,
                copied,
            } => anyhow::bail!(
                "archive ended inside entry {} ({} of {} bytes)",
                entry.display(),
                copied,
                expected
            ),
            Termination::TruncatedHeader { read } => {
                eprintln!(
                    "warning: archive ended inside the final header record ({} bytes)",
                    read
                );
                Ok(())
            }
            _ => Ok(()),
        }
    } else if let Some(matches) = matches.subcommand_matches("list") {
        list(
            matches.value_of("archive").unwrap(),
            matches.is_present("verbose"),
        )
        .map_err(anyhow::Error::new)
    } else if let Some(matches) = matches.subcommand_matches("verify") {
        let (entries, bytes) = verify(matches.value_of("archive").unwrap())?;
        println!("ok: {} entries, {} bytes", entries, bytes);
        Ok(())
    } else if let Some(matches) = matches.subcommand_matches("create") {
        let total = create(
            matches.value_of("archive").unwrap(),
            matches.value_of("dir").unwrap(),
        )?;
        println!("Wrote: {} bytes", total);
        Ok(())
    } else {
        Ok(())
    }
}
