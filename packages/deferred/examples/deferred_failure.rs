//! Example demonstrating how an initialization failure reaches every way of awaiting.

use std::cell::Cell;
use std::rc::Rc;

use deferred::{AsyncInit, Deferred};
use futures::executor::LocalPool;

/// A connection that refuses to open on port zero.
#[derive(Debug)]
struct Connection {
    port: Cell<u16>,
}

impl AsyncInit for Connection {
    type Args = u16;
    type Error = String;

    fn init(self: Rc<Self>, port: u16) -> impl Future<Output = Result<(), String>> + 'static {
        async move {
            if port == 0 {
                return Err("port 0 is not a valid destination".to_string());
            }

            self.port.set(port);
            Ok(())
        }
    }
}

fn main() {
    let mut pool = LocalPool::new();

    let connection = Deferred::builder().name("primary connection").build(
        &pool.spawner(),
        Connection { port: Cell::new(0) },
        0,
    );

    pool.run_until(async {
        match (&connection).await {
            Ok(connection) => println!("Connected on port {}", connection.port.get()),
            Err(error) => println!("{} failed: {error}", connection.name()),
        }

        let summary = connection
            .wait_or_else(
                |connection| format!("connected on port {}", connection.port.get()),
                |error| format!("not connected ({error})"),
            )
            .await;
        println!("Summary: {summary}");

        let outcome = connection
            .on_completion(|| println!("Connection attempt finished"))
            .await;
        println!("Still failed after cleanup: {}", outcome.is_err());

        let retry_hint = connection
            .on_failure(|error| format!("retry later: {error}"))
            .await;
        if let Err(hint) = retry_hint {
            println!("{hint}");
        }
    });

    println!("Final status: {:?}", connection.status());
}
