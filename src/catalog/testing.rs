//! Local HTTP fixture for tests that need a real network peer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve fixed bodies by path and return the base URL.
///
/// Requests for any other path are read and then left hanging.
pub async fn serve(routes: HashMap<String, (&'static str, Vec<u8>)>) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let routes = Arc::new(routes);

  tokio::spawn(async move {
    while let Ok((mut socket, _)) = listener.accept().await {
      let routes = routes.clone();
      tokio::spawn(async move {
        let mut buf = vec![0u8; 8192];
        let n = socket.read(&mut buf).await.unwrap_or(0);
        let request = String::from_utf8_lossy(&buf[..n]);
        let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

        match routes.get(&path) {
          Some((content_type, body)) => {
            let head = format!(
              "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
              content_type,
              body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
          }
          None => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            drop(socket);
          }
        }
      });
    }
  });

  format!("http://{}", addr)
}
