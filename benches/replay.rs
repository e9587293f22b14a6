//! Benchmark suite for scenario replay
//!
//! Replays synthetic command logs of increasing size through both output
//! strategies using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Each generated log mixes account creation, deposits, card payments,
//! transfers and equal split payments across a fixed set of users.

use bank_ledger::cli::OutputFormat;
use bank_ledger::config::EngineConfig;
use bank_ledger::strategy::create_strategy;
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

const USERS: usize = 20;

fn main() {
    divan::main();
}

fn iban(n: usize) -> String {
    format!("RO49POOB{:016}", n)
}

/// Build a scenario with `rounds` payment rounds per user
fn scenario(rounds: usize) -> Value {
    let users: Vec<Value> = (0..USERS)
        .map(|i| {
            json!({"firstName": format!("User{}", i), "lastName": "Bench",
                   "email": format!("user{}@bank.ro", i), "birthDate": "1990-01-01",
                   "occupation": if i % 3 == 0 { "student" } else { "engineer" }})
        })
        .collect();

    let mut commands = Vec::new();
    let mut ts = 0u64;
    for i in 0..USERS {
        ts += 1;
        let currency = if i % 2 == 0 { "RON" } else { "EUR" };
        let email = format!("user{}@bank.ro", i);
        commands.push(json!({"command": "addAccount", "timestamp": ts, "email": email,
                             "currency": currency, "accountType": "classic"}));
        commands.push(json!({"command": "addFunds", "timestamp": ts, "account": iban(i + 1),
                             "email": email, "amount": 1_000_000}));
        commands.push(json!({"command": "createCard", "timestamp": ts, "account": iban(i + 1),
                             "email": email}));
    }

    for round in 0..rounds {
        for i in 0..USERS {
            ts += 1;
            let email = format!("user{}@bank.ro", i);
            let card = format!("4000{:012}", i + 1);
            commands.push(json!({"command": "payOnline", "timestamp": ts, "cardNumber": card,
                                 "email": email, "amount": 25 + round % 400, "currency": "RON",
                                 "commerciant": if round % 2 == 0 { "Mega Image" } else { "Emag" }}));
            commands.push(json!({"command": "sendMoney", "timestamp": ts, "account": iban(i + 1),
                                 "receiver": iban((i + 1) % USERS + 1), "email": email,
                                 "amount": 3, "description": "bench"}));
        }
        ts += 1;
        let participants = [iban(1), iban(3), iban(5)];
        commands.push(json!({"command": "splitPayment", "timestamp": ts, "amount": 30,
                             "currency": "RON", "splitPaymentType": "equal",
                             "accounts": participants}));
        for user in [0, 2, 4] {
            commands.push(json!({"command": "acceptSplitPayment", "timestamp": ts,
                                 "email": format!("user{}@bank.ro", user),
                                 "splitPaymentType": "equal"}));
        }
    }
    commands.push(json!({"command": "printUsers", "timestamp": ts + 1}));

    json!({
        "users": users,
        "exchangeRates": [{"from": "EUR", "to": "RON", "rate": 4.97}],
        "commerciants": [
            {"commerciant": "Mega Image", "id": 1, "account": "RO-MEGA", "type": "Food",
             "cashbackStrategy": "nrOfTransactions"},
            {"commerciant": "Emag", "id": 2, "account": "RO-EMAG", "type": "Tech",
             "cashbackStrategy": "spendingThreshold"}
        ],
        "commands": commands,
    })
}

fn scenario_file(rounds: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(scenario(rounds).to_string().as_bytes())
        .expect("Failed to write scenario");
    file.flush().expect("Failed to flush scenario");
    file
}

/// Replay and print command outputs
#[divan::bench(args = [10, 100, 1000])]
fn report_strategy(bencher: divan::Bencher, rounds: usize) {
    let file = scenario_file(rounds);
    let strategy = create_strategy(OutputFormat::Report, EngineConfig::default());

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(file.path(), &mut output)
            .expect("Replay failed");
        output
    });
}

/// Replay and print the balances summary
#[divan::bench(args = [10, 100, 1000])]
fn balances_strategy(bencher: divan::Bencher, rounds: usize) {
    let file = scenario_file(rounds);
    let strategy = create_strategy(OutputFormat::Balances, EngineConfig::default());

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(file.path(), &mut output)
            .expect("Replay failed");
        output
    });
}
