//! Walks through the ownership relationships offered by `owned_ptr`.

use owned_ptr::{SharedPtr, UniquePtr};

struct Person {
    name: String,
}

impl Person {
    fn greet(&self) {
        println!("Hello, my name is {}", self.name);
    }
}

fn main() {
    // There can only be one owner of a `UniquePtr`.
    let mut alice = UniquePtr::new(Person {
        name: "Alice".to_string(),
    });
    alice.greet();

    // Ownership moves with `take()`, leaving the source null.
    let new_owner = alice.take();
    if alice.is_null() {
        println!("alice is now null");
    }
    new_owner.greet();

    // A `SharedPtr` can have many owners, tracked by the use count.
    let bob = SharedPtr::new(Person {
        name: "Bob".to_string(),
    });
    let also_bob = bob.clone();
    println!("Bob has {} owners", bob.use_count());

    // A `WeakPtr` observes without keeping Bob alive.
    let observer = bob.downgrade();
    drop(bob);
    drop(also_bob);

    match observer.lock().get_ref() {
        Ok(person) => person.greet(),
        Err(e) => println!("observer cannot reach Bob: {e}"),
    }
}
