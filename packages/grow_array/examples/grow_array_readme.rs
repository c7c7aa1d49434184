//! Shows the growth pattern of `grow_array::Array` and its checked accessors.

use grow_array::{Array, Error};

fn main() -> Result<(), Error> {
    let mut array = Array::new();

    for value in 1..=5 {
        array.push(value)?;
        println!(
            "pushed {value}: len = {}, capacity = {}",
            array.len(),
            array.capacity()
        );
    }

    println!("front = {}, back = {}", array.front()?, array.back()?);

    match array.at(10) {
        Ok(value) => println!("unexpectedly found {value}"),
        Err(e) => println!("checked access failed: {e}"),
    }

    array.resize(2, 0)?;
    array.shrink_to_fit()?;
    println!("after resize and shrink: {array:?}, capacity = {}", array.capacity());

    Ok(())
}
