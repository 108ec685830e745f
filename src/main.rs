use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
    process,
};

use clap::{Parser, Subcommand};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use private_trust::{Age, Amount, Identity, TrustError, TrustLedger, TrustSnapshot};

#[derive(Parser)]
#[command(name = "private-trust", version, about = "Trust fund ledger tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a random caller identity (20 bytes, hex)
    Identity,
    /// Apply a JSON-lines command script to a fresh trust
    Run {
        /// Script file, one command object per line
        script: PathBuf,
        /// Identity opening the trust
        #[arg(long)]
        trustor: Identity,
        /// Report failing commands and continue instead of aborting
        #[arg(long)]
        keep_going: bool,
    },
}

/// One line of a script file. Mirrors the ledger call surface; the
/// caller field carries the identity the host would have authenticated.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ScriptCommand {
    Deposit {
        caller: Identity,
        amount: Amount,
    },
    AssignTrustee {
        caller: Identity,
        trustee: Identity,
    },
    Designate {
        caller: Identity,
        name: String,
        age_threshold: Age,
    },
    Remove {
        caller: Identity,
        name: String,
    },
    AssignAddress {
        caller: Identity,
        address: Identity,
        name: String,
        claimed_age: Age,
    },
    Withdraw {
        address: Identity,
        name: String,
    },
}

fn apply(trust: &mut TrustLedger, command: ScriptCommand) -> Result<(), TrustError> {
    match command {
        ScriptCommand::Deposit { caller, amount } => trust.deposit(&caller, amount),
        ScriptCommand::AssignTrustee { caller, trustee } => {
            trust.assign_trustee(&caller, trustee)
        }
        ScriptCommand::Designate {
            caller,
            name,
            age_threshold,
        } => trust.designate_beneficiary(&caller, &name, age_threshold),
        ScriptCommand::Remove { caller, name } => trust.remove_beneficiary(&caller, &name),
        ScriptCommand::AssignAddress {
            caller,
            address,
            name,
            claimed_age,
        } => trust.assign_withdrawal_address(&caller, address, &name, claimed_age),
        ScriptCommand::Withdraw { address, name } => {
            trust.withdraw(&address, &name).map(|_| ())
        }
    }
}

fn identity_cmd() {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    println!("0x{}", hex::encode(bytes));
}

fn run_cmd(script: &PathBuf, trustor: Identity, keep_going: bool) {
    let file = match File::open(script) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("error: cannot open {}: {err}", script.display());
            process::exit(2);
        }
    };

    let mut trust = TrustLedger::new(trustor);
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("error: read failure at line {}: {err}", line_no + 1);
                process::exit(2);
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let command: ScriptCommand = match serde_json::from_str(trimmed) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("error: bad command at line {}: {err}", line_no + 1);
                process::exit(2);
            }
        };
        if let Err(err) = apply(&mut trust, command) {
            eprintln!("error: line {}: {err}", line_no + 1);
            if !keep_going {
                process::exit(2);
            }
        }
        for event in trust.drain_events() {
            match serde_json::to_string(&event) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    eprintln!("error: cannot encode event: {err}");
                    process::exit(2);
                }
            }
        }
    }

    match serde_json::to_string_pretty(&TrustSnapshot::of(&trust)) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("error: cannot encode snapshot: {err}");
            process::exit(2);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Identity => identity_cmd(),
        Command::Run {
            script,
            trustor,
            keep_going,
        } => run_cmd(&script, trustor, keep_going),
    }
}
