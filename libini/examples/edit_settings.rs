//! Load a settings file, repair what is missing or corrupt, and save it.
//!
//! Usage: cargo run --example edit_settings -- [PATH]

use libini::{read_or_default, write, Comment, CommentUpdate, Position, Result};
use std::env;

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "settings.ini".to_string());

    let (mut doc, recovery) = read_or_default(&path)?;
    let mut dirty = recovery.needs_write();

    if doc.is_empty() {
        doc.add_comment(Comment::new("; capture settings")?, Position::End)?;
    }

    let before = doc.to_raw_string();
    let preset = doc.get_or_repair(None, "selectedPreset", "standard".to_string())?;
    let quality = doc.get_or_repair(Some(preset.as_str()), "imageQuality", 90i64)?;
    let delay = doc.get_or_repair(Some("timer"), "delay", 1.5)?;
    dirty |= doc.to_raw_string() != before;

    println!("preset {}: quality {}, delay {}s", preset, quality, delay);

    if quality > 95 {
        let note = Comment::new("; capped")?;
        doc.set_value_in(&preset, "imageQuality", 95, CommentUpdate::Replace(note))?;
        dirty = true;
    }

    if dirty {
        write(&path, &doc)?;
        println!("wrote {}", path);
    }
    Ok(())
}
