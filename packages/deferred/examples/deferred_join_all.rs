//! Example demonstrating deferred instances combined with standard future combinators.

use std::cell::RefCell;
use std::rc::Rc;

use deferred::{AsyncInit, Deferred, Resolved};
use futures::executor::LocalPool;
use futures::future::{join_all, try_join_all};
use futures::task::LocalSpawn;

/// A document whose contents are loaded after construction.
#[derive(Debug)]
struct Document {
    title: &'static str,
    contents: RefCell<Option<String>>,
}

impl Document {
    fn open(spawner: &impl LocalSpawn, title: &'static str) -> Deferred<Self> {
        let document = Self {
            title,
            contents: RefCell::new(None),
        };

        Deferred::builder()
            .name(title)
            .build(spawner, document, ())
    }
}

impl AsyncInit for Document {
    type Args = ();
    type Error = String;

    fn init(self: Rc<Self>, (): ()) -> impl Future<Output = Result<(), String>> + 'static {
        async move {
            if self.title.is_empty() {
                return Err("untitled documents cannot be loaded".to_string());
            }

            *self.contents.borrow_mut() = Some(format!("The contents of {}.", self.title));
            Ok(())
        }
    }
}

fn describe(document: &Resolved<Document>) -> String {
    format!(
        "{}: {}",
        document.title,
        document.contents.borrow().as_deref().unwrap_or("<empty>")
    )
}

fn main() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    pool.run_until(async {
        println!("=== All documents load ===");
        let documents = try_join_all([
            Document::open(&spawner, "README"),
            Document::open(&spawner, "CHANGELOG"),
        ])
        .await
        .expect("all documents have titles");

        for document in &documents {
            println!("{}", describe(document));
        }

        println!("\n=== One document fails ===");
        let outcomes = join_all([
            Document::open(&spawner, "LICENSE"),
            Document::open(&spawner, ""),
        ])
        .await;

        for outcome in outcomes {
            match outcome {
                Ok(document) => println!("{}", describe(&document)),
                Err(error) => println!("failed: {error}"),
            }
        }
    });
}
