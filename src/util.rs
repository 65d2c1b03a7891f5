use std::io::{stdout, BufRead, Write};

use anyhow::{bail, Result};
use number::UnipolarFloat;

/// Scale value into the provided integer range.
/// The range is inclusive at both ends.
pub fn unipolar_to_range(start: u8, end: u8, value: UnipolarFloat) -> u8 {
    if end > start {
        ((end - start) as f64 * value.val()).round() as u8 + start
    } else {
        ((start - end) as f64 * value.invert().val()).round() as u8 + end
    }
}

/// Prompt the user until they provide input that parses.
/// Fail if the input ends first.
pub fn prompt_parse<R, T, F>(input: &mut R, msg: &str, parse: F) -> Result<T>
where
    R: BufRead,
    F: Fn(&str) -> Result<T>,
{
    loop {
        print!("{msg}: ");
        stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("end of input");
        }
        match parse(line.trim()) {
            Ok(v) => return Ok(v),
            Err(e) => println!("{e:#}"),
        }
    }
}
