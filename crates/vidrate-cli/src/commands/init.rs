//! The `vidrate init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create vidrate.toml
    if std::path::Path::new("vidrate.toml").exists() {
        println!("vidrate.toml already exists, skipping.");
    } else {
        std::fs::write("vidrate.toml", SAMPLE_CONFIG)?;
        println!("Created vidrate.toml");
    }

    // Create example playlists for tester 1
    std::fs::create_dir_all("playlists")?;
    std::fs::create_dir_all("clips")?;
    for (name, content) in [
        ("playlist10.cfg", EXAMPLE_TRAINING_PLAYLIST),
        ("playlist11.cfg", EXAMPLE_REAL_PLAYLIST),
    ] {
        let path = std::path::Path::new("playlists").join(name);
        if path.exists() {
            println!("playlists/{name} already exists, skipping.");
        } else {
            std::fs::write(&path, content)?;
            println!("Created playlists/{name}");
        }
    }

    println!("\nNext steps:");
    println!("  1. Put the clips into clips/ and set player_command in vidrate.toml");
    println!("  2. Run: vidrate validate --tester 1");
    println!("  3. Run: vidrate session");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# vidrate configuration

playlist_dir = "./playlists"
playlist_prefix = "playlist"
playlist_extension = "cfg"

clip_dir = "./clips"
# player_command = "mpv --really-quiet --fs {}"

data_dir = "./vidrate-data"
export_dir = "${HOME}/Downloads"
ratings_file = "ratings.csv"
state_file = "session.json"

session_marker = true
rating_scale = ["1 - Bad", "2 - Poor", "3 - Fair", "4 - Good", "5 - Excellent"]
"#;

const EXAMPLE_TRAINING_PLAYLIST: &str = "training_low.mp4
training_high.mp4
";

const EXAMPLE_REAL_PLAYLIST: &str = "clip01_crf18.mp4
clip01_crf35.mp4
clip02_crf18.mp4
clip02_crf35.mp4
";
