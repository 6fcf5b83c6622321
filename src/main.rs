//! Pixel font builder: dump reference fonts, merge glyph sources, and write
//! every font format for every size and width mode.

use fusion_pixel::core;

fn main() {
    let cli_args = core::platform::get_cli_args();
    if let Err(error) = core::runner::run_app(cli_args) {
        core::platform::handle_error(error);
    }
}
