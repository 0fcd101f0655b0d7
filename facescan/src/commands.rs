use crate::CLAP_STYLING;
use clap::{arg, command};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("facescan")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("facescan")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner, spinner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Enable debug logging (per-URL skip reasons)").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("scan")
                .about(
                    "Probe every host on the standard RichFaces / JSF / Seam ports and paths \
                and report signature matches.",
                )
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(true)
                        .help("Newline-delimited file of hosts to scan")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help(
                            "File the findings are saved to (only written when something \
                        matched)",
                        )
                        .value_parser(clap::value_parser!(String))
                        .default_value("resultados.txt"),
                )
                .arg(
                    arg!(-w --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of parallel workers in the pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    arg!(-s --"signatures" <PATH>)
                        .required(false)
                        .help(
                            "JSON signature file overriding the built-in patterns, paths \
                        and ports",
                        )
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds (at least 1)")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"max-redirects" <NUM>)
                        .required(false)
                        .help("Most requests one redirect chain may take before it is dropped")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"strict-tls")
                        .required(false)
                        .help(
                            "Verify TLS certificates. By default invalid and self-signed \
                        certificates are accepted.",
                        )
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output file format: text, json, csv")
                        .value_parser(["text", "json", "csv"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("signatures")
                .about("Print the built-in signature set as JSON (a template for --signatures)"),
        )
}
