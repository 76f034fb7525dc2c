mod app;
mod entry;
mod logger;

use statkeep::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
