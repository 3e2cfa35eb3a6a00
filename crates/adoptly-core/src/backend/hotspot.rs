// ── hotspot backend ──
//
// Owns the whole `hotspot` package: it is created when absent, emptied on
// every run, and rebuilt as a single `settings` section.

use super::{Backend, PackagePolicy, PortalSettings};
use crate::context::ParseContext;
use crate::error::CoreError;

const PACKAGE: &str = "hotspot";
const SECTION: &str = "settings";

#[derive(Debug, Clone, Copy, Default)]
pub struct Hotspot;

impl Backend for Hotspot {
    fn name(&self) -> &'static str {
        "hotspot"
    }

    fn package(&self) -> &'static str {
        PACKAGE
    }

    fn init(&self, ctx: &mut ParseContext<'_>) -> Result<(), CoreError> {
        ctx.open_package(PACKAGE, PackagePolicy::CreateIfMissing, adoptly_uci::Package::clear)
    }

    fn process(&self, ctx: &mut ParseContext<'_>) -> Result<(), CoreError> {
        let settings = PortalSettings::from_payload(&ctx.payload())?;
        ctx.new_section("hotspot", SECTION)?;
        settings.stage(ctx, SECTION)
    }
}
