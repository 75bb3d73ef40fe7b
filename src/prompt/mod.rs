//! Interactive stdin prompts: pick one of a list, or type a value.

use std::{
    fmt::Display,
    io::{self, BufRead, Write},
};

use anyhow::{bail, Result};
use is_terminal::IsTerminal;

fn require_terminal() -> Result<()> {
    if !io::stdin().is_terminal() {
        bail!("this command needs an interactive terminal");
    }
    Ok(())
}

/// Ask the user to pick one of `items` by number.
pub fn select<'a, T: Display>(title: &str, items: &'a [T]) -> Result<&'a T> {
    require_terminal()?;
    let stdin = io::stdin();
    select_from(&mut stdin.lock(), &mut io::stdout(), title, items)
}

/// Ask for a free-text value; blank answers are asked again.
pub fn ask(label: &str) -> Result<String> {
    require_terminal()?;
    let stdin = io::stdin();
    ask_from(&mut stdin.lock(), &mut io::stdout(), label)
}

pub fn select_from<'a, T: Display, R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    title: &str,
    items: &'a [T],
) -> Result<&'a T> {
    if items.is_empty() {
        bail!("nothing to choose from");
    }
    writeln!(output, "{}", title)?;
    for (i, item) in items.iter().enumerate() {
        writeln!(output, "  {}) {}", i + 1, item)?;
    }
    loop {
        write!(output, "Choice [1-{}]: ", items.len())?;
        output.flush().ok();
        let Some(line) = read_line(input)? else {
            bail!("no selection made");
        };
        match line.parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) => return Ok(&items[n - 1]),
            _ => writeln!(output, "Please enter a number between 1 and {}", items.len())?,
        }
    }
}

pub fn ask_from<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    loop {
        write!(output, "{}: ", label)?;
        output.flush().ok();
        match read_line(input)? {
            Some(line) if !line.is_empty() => return Ok(line),
            Some(_) => continue,
            None => bail!("no value given for {}", label),
        }
    }
}

/// `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}
