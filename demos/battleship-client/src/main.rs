//! Interactive terminal client.
//!
//! Every line typed on stdin goes to the server as a frame with the next
//! sequence number. Server frames are decoded and printed; `GRID` blocks
//! are printed as they arrive until their closing blank line.

use broadside_protocol::{AesCtrCipher, DEV_KEY, FrameCodec, GRID_SENTINEL};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tracing_subscriber::EnvFilter;

type Codec = FrameCodec<AesCtrCipher>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let addr = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BROADSIDE_ADDR").ok())
        .unwrap_or_else(|| "127.0.0.1:5000".to_string());

    let stream = TcpStream::connect(&addr).await?;
    tracing::info!(%addr, "connected");
    let (read, mut write) = stream.into_split();
    let codec = Codec::new(AesCtrCipher::new(DEV_KEY));

    let printer = tokio::spawn(print_server(read, codec.clone()));

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut seq = 0;
    while let Some(line) = stdin.next_line().await? {
        let frame = codec.encode(seq, line.trim_end());
        seq += 1;
        if write.write_all(format!("{frame}\n").as_bytes()).await.is_err() {
            break;
        }
        if printer.is_finished() {
            break;
        }
    }

    printer.abort();
    Ok(())
}

/// Prints everything the server says until it hangs up.
async fn print_server(read: OwnedReadHalf, codec: Codec) {
    let mut lines = BufReader::new(read).lines();
    let mut in_grid = false;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                println!("Server closed the connection.");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "read failed");
                return;
            }
        };

        if in_grid {
            println!("{line}");
            in_grid = !line.is_empty();
            continue;
        }
        if line == GRID_SENTINEL {
            in_grid = true;
            continue;
        }

        match codec.decode(&line) {
            Ok(frame) => println!("{}", frame.plaintext),
            Err(e) => tracing::warn!(error = %e, "dropping unreadable frame"),
        }
    }
}
