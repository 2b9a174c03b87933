pub mod actions;
pub mod config;

use clap::{Arg, ArgMatches, Command};

/// Build the command definition. Kept separate from [`parse_args`] so tests
/// can drive it with synthetic argv.
pub fn build_command() -> Command {
    Command::new("modpoll")
        .about("Poll a Modbus device and display the values in a live terminal dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("mode")
                .short('m')
                .value_name("MODE")
                .help("Communication mode: tcp (default), udp, rtu or ascii")
                .default_value("tcp"),
        )
        .arg(
            Arg::new("slave")
                .short('a')
                .value_name("ID")
                .help("Slave address (1-247, 1 is default)")
                .default_value("1")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("reference")
                .short('r')
                .value_name("REF")
                .help("Start data reference (1-65536, 100 is default)")
                .default_value("100")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("count")
                .short('c')
                .value_name("COUNT")
                .help("Number of data values to read (1-125, 1 is default)")
                .default_value("1")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("type")
                .short('t')
                .value_name("TYPE")
                .help("Data type: 1 coils, 2 discrete inputs, 3 input registers, 4 holding registers")
                .default_value("3")
                .value_parser(clap::value_parser!(u8)),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .value_name("PORT")
                .help("TCP port number (502 is default)")
                .default_value("502")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("rate")
                .short('R')
                .value_name("MILLIS")
                .help("Poll rate in milliseconds (1000 is default)")
                .default_value("1000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Poll once, print the values as JSON and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("host")
                .value_name("HOST")
                .help("Device host name or IPv4 address")
                .required(true),
        )
}

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    build_command().get_matches()
}
