use std::io::Write;

pub fn readline() -> Result<String, String> {
    write!(std::io::stdout(), "eqlog> ").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    let mut buffer = String::new();
    let read = std::io::stdin()
        .read_line(&mut buffer)
        .map_err(|e| e.to_string())?;
    if read == 0 {
        // Closed stdin behaves like `exit`
        return Ok("exit".to_string());
    }
    Ok(buffer)
}
