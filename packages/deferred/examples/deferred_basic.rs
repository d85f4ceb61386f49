//! Example demonstrating a type that finishes initializing asynchronously.

use std::cell::RefCell;
use std::rc::Rc;

use deferred::{AsyncInit, Deferred, Status};
use futures::executor::LocalPool;
use futures::task::LocalSpawn;

/// A greeting whose name is only known once its initializer has run.
#[derive(Debug)]
struct Greeting {
    value: RefCell<String>,
}

impl Greeting {
    fn new(spawner: &impl LocalSpawn, input: Option<&str>) -> Deferred<Self> {
        let greeting = Self {
            value: RefCell::new(String::new()),
        };

        Deferred::new(spawner, greeting, input.map(str::to_string))
    }

    fn name(&self) -> String {
        self.value.borrow().clone()
    }
}

impl AsyncInit for Greeting {
    type Args = Option<String>;
    type Error = String;

    fn init(
        self: Rc<Self>,
        input: Option<String>,
    ) -> impl Future<Output = Result<(), String>> + 'static {
        async move {
            *self.value.borrow_mut() = input.unwrap_or_else(|| "asd".to_string());
            Ok(())
        }
    }
}

fn main() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let given = Greeting::new(&spawner, Some("abc"));
    let default = Greeting::new(&spawner, None);

    println!("Right after construction: {:?}", given.status());
    assert_eq!(given.status(), Status::NotStarted);

    pool.run_until(async {
        let given = given.await.expect("initializer does not fail");
        println!("Given name: {}", given.name());

        // The same instance can be awaited as many times as needed.
        let first = (&default).await.expect("initializer does not fail");
        let second = (&default).await.expect("initializer does not fail");
        println!("Default name: {}", first.name());
        println!(
            "Both awaits produced the same instance: {}",
            deferred::Resolved::ptr_eq(&first, &second)
        );
    });
}
