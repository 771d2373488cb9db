use futures::StreamExt;
use tokio_tungstenite::connect_async;

/// Minimal demo subscriber: connects to a running table's event stream and
/// prints every `game_update`/`game_summary_notification` it receives.
/// Table/game lifecycle (join, start, act) goes over the REST API in
/// `spec.md` §6.1 and isn't reproduced here — this client only exercises
/// the WebSocket half of the surface, the same scope the teacher's demo
/// client covered.
#[tokio::main]
async fn main() {
    let game_id = std::env::args().nth(1).unwrap_or_else(|| "table-1".to_string());
    let token = std::env::args().nth(2);
    let host = std::env::args().nth(3).unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let url = match &token {
        Some(t) => format!("ws://{host}/ws/game/{game_id}/?token={t}"),
        None => format!("ws://{host}/ws/game/{game_id}/"),
    };

    println!("connecting to {url}");
    let (mut ws, _response) = connect_async(url.as_str()).await.expect("connect");

    let mut reads = 0;
    while reads < 1000 {
        match ws.next().await {
            Some(Ok(msg)) => println!("<- {msg}"),
            Some(Err(err)) => {
                println!("connection error: {err}");
                break;
            }
            None => break,
        }
        reads += 1;
    }
}
