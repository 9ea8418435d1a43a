use bulletin_board::{blocking, logger};

fn main() -> bulletin_board::Result<()> {
    logger::setup_logger();

    let key = "what is love?";
    let value = "Baby don't hurt me, don't hurt me no more.";
    blocking::put(key, value)?;

    println!("{key} {:?}", blocking::get(key)?);
    Ok(())
}
