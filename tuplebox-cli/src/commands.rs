//! Command execution.

use crate::Commands;
use colored::Colorize;
use serde::Serialize;
use tuplebox_client::Client;
use tuplebox_protocol::{
    DeleteOptions, Field, InsertMode, InsertOptions, Reply, SelectOptions, UpdateOp, UpdateOptions,
};

#[derive(Serialize)]
struct PingOutput {
    rtt_ms: f64,
}

/// Executes a command and returns the formatted output.
pub async fn execute(
    client: &mut Client,
    cmd: Commands,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Ping => {
            let rtt = client.ping().await?;
            let rtt_ms = rtt.as_secs_f64() * 1000.0;
            if json {
                return Ok(serde_json::to_string_pretty(&PingOutput { rtt_ms })?);
            }
            Ok(format!("{} ({:.3} ms)", "PONG".green(), rtt_ms))
        }

        Commands::Insert {
            values,
            return_tuple,
            add,
            replace,
        } => {
            let tuple = parse_fields(&values);
            let mut opts = InsertOptions::new().mode(insert_mode(add, replace));
            if return_tuple {
                opts = opts.return_tuple();
            }
            let reply = client.insert(tuple, opts).await?;
            format_reply(&reply, json, "Inserted")
        }

        Commands::Select {
            keys,
            index,
            offset,
            limit,
        } => {
            let opts = SelectOptions::new().index(index).offset(offset).limit(limit);
            let reply = client.select(parse_fields(&keys), opts).await?;
            if !json && reply.tuples.is_empty() {
                return Ok("No tuples found".yellow().to_string());
            }
            format_reply(&reply, json, "Selected")
        }

        Commands::Delete { key } => {
            let reply = client
                .delete(Field::parse_arg(&key), DeleteOptions::new())
                .await?;
            format_reply(&reply, json, "Deleted")
        }

        Commands::Update {
            key,
            ops,
            return_tuple,
        } => {
            let ops = ops
                .iter()
                .map(|op| op.parse::<UpdateOp>())
                .collect::<Result<Vec<_>, _>>()?;
            let mut opts = UpdateOptions::new();
            if return_tuple {
                opts = opts.return_tuple();
            }
            let reply = client
                .update_fields(Field::parse_arg(&key), ops, opts)
                .await?;
            format_reply(&reply, json, "Updated")
        }

        Commands::Call { name, args } => {
            let reply = client.call(name, parse_fields(&args)).await?;
            format_reply(&reply, json, "Returned")
        }
    }
}

fn insert_mode(add: bool, replace: bool) -> InsertMode {
    match (add, replace) {
        (true, _) => InsertMode::Add,
        (false, true) => InsertMode::Replace,
        (false, false) => InsertMode::Store,
    }
}

fn parse_fields(args: &[String]) -> Vec<Field> {
    args.iter().map(|arg| Field::parse_arg(arg)).collect()
}

/// Formats a reply as a count line followed by one line per tuple.
fn format_reply(
    reply: &Reply,
    json: bool,
    verb: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    if json {
        return Ok(serde_json::to_string_pretty(reply)?);
    }

    let noun = if reply.affected == 1 { "tuple" } else { "tuples" };
    let mut output = format!("{} {} {}", verb.green(), reply.affected, noun);
    for tuple in &reply.tuples {
        output.push_str(&format!("\n  {}", tuple.to_string().cyan()));
    }
    Ok(output)
}
