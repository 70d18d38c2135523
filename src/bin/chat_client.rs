//! Interactive chat client
//!
//! Connects, sends the display name as the first line, then forwards
//! stdin lines to the server while printing everything it receives.
//! `/quit`, `/exit`, stdin EOF or Ctrl+C disconnect.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use chat_server::types::MAX_NAME_LENGTH;

#[derive(Debug, Parser)]
#[command(name = "chat_client", version, about = "Connect to a chat server")]
struct Args {
    /// Display name (no whitespace)
    #[arg(value_parser = parse_name)]
    name: String,

    /// Server host name or address
    host: String,

    /// Server port (1-65535)
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

fn parse_name(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if s.len() > MAX_NAME_LENGTH {
        return Err(format!("name is too long (max {} characters)", MAX_NAME_LENGTH));
    }
    if s.chars().any(char::is_whitespace) {
        return Err("name cannot contain whitespace".to_string());
    }
    Ok(s.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let stream = TcpStream::connect((args.host.as_str(), args.port)).await?;
    println!(
        "Connected to server '{}' on port {} as '{}'.",
        args.host, args.port, args.name
    );

    let (mut read_half, mut write_half) = stream.into_split();
    write_half
        .write_all(format!("{}\n", args.name).as_bytes())
        .await?;

    // Server output is printed verbatim
    let mut receiver = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        match tokio::io::copy(&mut read_half, &mut stdout).await {
            Ok(_) => println!("\nServer disconnected."),
            Err(e) => eprintln!("\nrecv failed: {}", e),
        }
    });

    println!("Enter messages or commands (/list, /pm <user> <msg>, /delay <sec> <user> <msg>, /quit):");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nCtrl+C detected. Shutting down...");
                break;
            }
            _ = &mut receiver => {
                return Ok(());
            }
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    println!("\nInput closed (EOF).");
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" || line == "/exit" {
                    break;
                }
                if let Err(e) = write_half.write_all(format!("{}\n", line).as_bytes()).await {
                    eprintln!("Server connection lost while sending: {}", e);
                    break;
                }
            }
        }
    }

    println!("Disconnecting...");
    write_half.shutdown().await?;
    let _ = receiver.await;
    println!("Exited.");
    Ok(())
}
