//! # CLI - RiptideKV Interactive Shell
//!
//! A REPL-style command-line interface for the RiptideKV storage engine.
//! Reads commands from stdin, executes them against an in-memory [`Engine`],
//! and prints results to stdout. Designed for both interactive use and
//! scripted testing (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! SET key value [ttl_ms]   Insert or update a key, with an optional TTL
//! GET key                  Look up a key (prints value or "(nil)")
//! DEL key                  Delete a key (writes a tombstone)
//! EXISTS key               1 if a live value exists, else 0
//! EXPIRE key ttl_ms        Set a key's expiry
//! TTL key                  Remaining TTL in seconds, -1 none, -2 absent
//! INCR key / DECR key      Increment/decrement a key parsed as an integer
//! KEYS [pattern]           List live keys, optionally glob-filtered
//! MGET key [key...]        Look up several keys at once
//! MSET key value [...]     Write several key/value pairs, no TTL, no atomicity
//! FLUSHALL                 Clear the memtable, every run, and the WAL
//! COMPACT                  Run one compaction step if any level is over budget
//! INFO                     Print engine statistics
//! EXIT / QUIT              Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! Engine tuning is controlled via environment variables:
//!
//! ```text
//! RIPTIDE_MAX_MEMTABLE_MB         Flush threshold in MiB      (default: 64)
//! RIPTIDE_COMPACTION_INTERVAL_MS  Advisory tick interval      (default: 60000)
//! RIPTIDE_ENABLE_BLOOM_FILTER     Build bloom filters on runs (default: true)
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! RiptideKV started (max_memtable_mb=64, bloom=true)
//! > SET name Alice
//! OK
//! > GET name
//! Alice
//! > EXIT
//! bye
//! ```

use std::io::{self, BufRead, Write};

use anyhow::Result;
use config::EngineConfig;
use engine::Engine;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn config_from_env() -> EngineConfig {
    let defaults = EngineConfig::default();
    EngineConfig {
        max_memtable_size_mb: env_or(
            "RIPTIDE_MAX_MEMTABLE_MB",
            &defaults.max_memtable_size_mb.to_string(),
        )
        .parse()
        .unwrap_or(defaults.max_memtable_size_mb),
        compaction_interval_ms: env_or(
            "RIPTIDE_COMPACTION_INTERVAL_MS",
            &defaults.compaction_interval_ms.to_string(),
        )
        .parse()
        .unwrap_or(defaults.compaction_interval_ms),
        enable_bloom_filter: env_or(
            "RIPTIDE_ENABLE_BLOOM_FILTER",
            &defaults.enable_bloom_filter.to_string(),
        )
        .parse()
        .unwrap_or(defaults.enable_bloom_filter),
        ..defaults
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = config_from_env();
    let mut engine = Engine::new(config.clone());

    println!(
        "RiptideKV started (max_memtable_mb={}, bloom={})",
        config.max_memtable_size_mb, config.enable_bloom_filter
    );
    println!("Commands: SET key value [ttl_ms] | GET key | DEL key | EXISTS key");
    println!("          EXPIRE key ttl_ms | TTL key | INCR key | DECR key");
    println!("          KEYS [pattern] | MGET key [key...] | MSET key value [...]");
    println!("          FLUSHALL | COMPACT | INFO | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            let rest: Vec<&str> = parts.collect();
            match cmd.to_uppercase().as_str() {
                "SET" => match rest.as_slice() {
                    [key, value] => {
                        print_result(engine.set((*key).to_string(), value.as_bytes().to_vec(), None));
                    }
                    [key, value, ttl] => match ttl.parse::<u64>() {
                        Ok(ttl_ms) => print_result(engine.set(
                            (*key).to_string(),
                            value.as_bytes().to_vec(),
                            Some(ttl_ms),
                        )),
                        Err(_) => println!("ERR ttl_ms must be a non-negative integer"),
                    },
                    _ => println!("ERR usage: SET key value [ttl_ms]"),
                },
                "GET" => match rest.as_slice() {
                    [key] => match engine.get(key) {
                        Ok(Some(v)) => println!("{}", String::from_utf8_lossy(&v)),
                        Ok(None) => println!("(nil)"),
                        Err(e) => println!("ERR {e}"),
                    },
                    _ => println!("ERR usage: GET key"),
                },
                "DEL" => match rest.as_slice() {
                    [key] => match engine.del(key) {
                        Ok(existed) => println!("{}", i32::from(existed)),
                        Err(e) => println!("ERR {e}"),
                    },
                    _ => println!("ERR usage: DEL key"),
                },
                "EXISTS" => match rest.as_slice() {
                    [key] => match engine.exists(key) {
                        Ok(exists) => println!("{}", i32::from(exists)),
                        Err(e) => println!("ERR {e}"),
                    },
                    _ => println!("ERR usage: EXISTS key"),
                },
                "EXPIRE" => match rest.as_slice() {
                    [key, ttl] => match ttl.parse::<u64>() {
                        Ok(ttl_ms) => match engine.expire(key, ttl_ms) {
                            Ok(applied) => println!("{}", i32::from(applied)),
                            Err(e) => println!("ERR {e}"),
                        },
                        Err(_) => println!("ERR ttl_ms must be a non-negative integer"),
                    },
                    _ => println!("ERR usage: EXPIRE key ttl_ms"),
                },
                "TTL" => match rest.as_slice() {
                    [key] => match engine.ttl(key) {
                        Ok(ttl) => println!("{ttl}"),
                        Err(e) => println!("ERR {e}"),
                    },
                    _ => println!("ERR usage: TTL key"),
                },
                "INCR" => match rest.as_slice() {
                    [key] => match engine.incr(key) {
                        Ok(v) => println!("{v}"),
                        Err(e) => println!("ERR {e}"),
                    },
                    _ => println!("ERR usage: INCR key"),
                },
                "DECR" => match rest.as_slice() {
                    [key] => match engine.decr(key) {
                        Ok(v) => println!("{v}"),
                        Err(e) => println!("ERR {e}"),
                    },
                    _ => println!("ERR usage: DECR key"),
                },
                "KEYS" => {
                    let pattern = rest.first().copied();
                    match engine.keys(pattern) {
                        Ok(keys) => {
                            if keys.is_empty() {
                                println!("(empty)");
                            } else {
                                for k in &keys {
                                    println!("{k}");
                                }
                            }
                        }
                        Err(e) => println!("ERR {e}"),
                    }
                }
                "MGET" => {
                    if rest.is_empty() {
                        println!("ERR usage: MGET key [key...]");
                    } else {
                        let keys: Vec<String> = rest.iter().map(|s| (*s).to_string()).collect();
                        match engine.mget(&keys) {
                            Ok(values) => {
                                for v in values {
                                    match v {
                                        Some(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
                                        None => println!("(nil)"),
                                    }
                                }
                            }
                            Err(e) => println!("ERR {e}"),
                        }
                    }
                }
                "MSET" => {
                    if rest.is_empty() || rest.len() % 2 != 0 {
                        println!("ERR usage: MSET key value [key value...]");
                    } else {
                        let entries = rest
                            .chunks(2)
                            .map(|pair| (pair[0].to_string(), pair[1].as_bytes().to_vec(), None))
                            .collect();
                        print_result(engine.mset(entries));
                    }
                }
                "FLUSHALL" => {
                    engine.flush_all();
                    println!("OK");
                }
                "COMPACT" => {
                    engine.maybe_run_compaction_tick();
                    println!("OK (runs={})", engine.run_count());
                }
                "INFO" => {
                    println!("{:?}", engine.info());
                }
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => {
                    println!("unknown command: {other}");
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}

fn print_result(result: Result<(), engine::EngineError>) {
    match result {
        Ok(()) => println!("OK"),
        Err(e) => println!("ERR {e}"),
    }
}
