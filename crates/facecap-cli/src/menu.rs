//! Interactive text menu.

use anyhow::Result;
use std::io::{BufRead, Write};

/// What the menu can ask the rest of the program to do.
pub trait MenuActions {
    /// Run a capture session for `name` (already trimmed).
    fn capture(&mut self, name: &str) -> Result<()>;
    /// Load the enrollment and run a recognition session.
    fn recognize(&mut self) -> Result<()>;
}

/// One line from `input`, trimmed; `None` at end of input.
fn read_trimmed<R: BufRead + ?Sized>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Prompt until the operator exits or input ends.
///
/// Errors from an action end the menu and propagate.
pub fn run_menu<R, W, A>(input: &mut R, out: &mut W, actions: &mut A) -> Result<()>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
    A: MenuActions + ?Sized,
{
    loop {
        writeln!(out)?;
        writeln!(out, "1. Capture images")?;
        writeln!(out, "2. Start recognition")?;
        writeln!(out, "3. Exit")?;
        write!(out, "Option: ")?;
        out.flush()?;

        let Some(option) = read_trimmed(input)? else {
            return Ok(());
        };

        match option.as_str() {
            "1" => {
                write!(out, "Person's name: ")?;
                out.flush()?;
                let Some(name) = read_trimmed(input)? else {
                    return Ok(());
                };
                actions.capture(&name)?;
            }
            "2" => actions.recognize()?,
            "3" => return Ok(()),
            _ => writeln!(out, "Invalid option.")?,
        }
    }
}
