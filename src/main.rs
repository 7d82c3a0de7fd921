use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, error, info};

use dns_rr_codec::packet::record::DEFAULT_TTL;
use dns_rr_codec::{logging, CodeOrLabel, DnsError, ErrorConverter, Record};

const LOGGER: &str = "dns_rr";

#[derive(Debug, Parser)]
#[command(name = "dns-rr", version, about = "Pack and unpack single DNS resource records")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encode a record and print it as hex
    Pack {
        /// Owner name, e.g. www.example.com
        name: String,
        /// Address for A/AAAA, text otherwise
        rdata: String,
        /// Record type label or code
        #[arg(short = 't', long = "type", default_value = "A")]
        rtype: CodeOrLabel,
        #[arg(long, default_value_t = DEFAULT_TTL)]
        ttl: u32,
        /// Record class label or code
        #[arg(short, long, default_value = "IN")]
        class: CodeOrLabel,
    },
    /// Decode a hex encoded record
    Unpack { hex: String },
}

fn pack(
    name: String,
    rdata: String,
    rtype: CodeOrLabel,
    ttl: u32,
    class: CodeOrLabel,
) -> anyhow::Result<()> {
    let record = Record::new(name, rdata, rtype, ttl, class)?;
    debug!("packing {record}");

    println!("{}", hex::encode(record.pack()?));
    Ok(())
}

fn unpack(input: &str) -> anyhow::Result<()> {
    let data = hex::decode(input.trim()).context("input is not valid hex")?;
    let (consumed, record) = Record::unpack(&data)?;

    if consumed < data.len() {
        info!("ignoring {} trailing bytes", data.len() - consumed);
    }

    println!("{}", describe(consumed, &record));
    Ok(())
}

/// The record in zone-file form, followed by how many bytes it took.
fn describe(consumed: usize, record: &Record) -> String {
    format!("{record} ; {consumed} bytes")
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Pack {
            name,
            rdata,
            rtype,
            ttl,
            class,
        } => {
            let guard = ErrorConverter::new(["SERVFAIL"], Some(LOGGER))?;
            guard.run(|| pack(name, rdata, rtype, ttl, class))?;
        }
        Command::Unpack { hex } => {
            let guard = ErrorConverter::new(["FORMERR"], Some(LOGGER))?;
            guard.run(|| unpack(&hex))?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");

            // Exit with the RCODE so scripts can tell failures apart.
            let status = e
                .downcast_ref::<DnsError>()
                .and_then(DnsError::header_rcode)
                .map(u8::from)
                .filter(|&x| x != 0)
                .unwrap_or(1);
            ExitCode::from(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_unpacked_record() {
        let data = std::fs::read("test_data/www_example_com_a.bin").unwrap();
        let (consumed, record) = Record::unpack(&data).unwrap();
        assert_eq!(consumed, 31);
        assert_eq!(
            describe(consumed, &record),
            "www.example.com. 1800 IN A 1.2.3.4 ; 31 bytes"
        );
    }
}
