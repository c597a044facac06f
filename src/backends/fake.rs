//! A backend that writes placeholder files instead of invoking generators.
//!
//! Used to exercise the pipeline end to end without any external tooling.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::Backend;
use crate::error::Result;
use crate::resolve::ResolvedLibrary;
use crate::sources::SourceBundle;

pub const POST_GENERATE_FILE: &str = "POST_GENERATE_README.md";

pub struct FakeBackend {
    root: PathBuf,
}

impl FakeBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

pub fn readme_contents(name: &str) -> String {
    format!("# {}\n\nGenerated library\n", name)
}

fn starter_contents(name: &str) -> String {
    format!("# {}\n\nThis is a starter file.\n", name)
}

impl Backend for FakeBackend {
    // Fake output is overwritten in place.
    fn clean(&self, _library: &ResolvedLibrary) -> Result<()> {
        Ok(())
    }

    fn generate(&self, libraries: &[ResolvedLibrary], _sources: &SourceBundle) -> Result<()> {
        for library in libraries {
            let output = Path::new(&library.output);
            fs::create_dir_all(output)?;
            fs::write(output.join("README.md"), readme_contents(&library.name))?;
            let starter = output.join("STARTER.md");
            if !starter.exists() {
                fs::write(starter, starter_contents(&library.name))?;
            }
            info!("Generated {} into {}", library.name, output.display());
        }
        Ok(())
    }

    fn format(&self, library: &ResolvedLibrary) -> Result<()> {
        let readme = Path::new(&library.output).join("README.md");
        let mut contents = fs::read_to_string(&readme)?;
        contents.push_str("\n---\nFormatted\n");
        fs::write(readme, contents)?;
        Ok(())
    }

    fn post_generate(&self) -> Result<()> {
        fs::write(
            self.root.join(POST_GENERATE_FILE),
            "# Post-generate\n\nAll libraries were generated.\n",
        )?;
        Ok(())
    }
}
