// ── chilli backend ──
//
// Updates the first `chilli` section of an existing `chilli` package in
// place. Options the payload does not cover are kept.

use adoptly_uci::SectionRef;

use super::{Backend, PackagePolicy, PortalSettings};
use crate::context::ParseContext;
use crate::error::CoreError;

const PACKAGE: &str = "chilli";
const SECTION_TYPE: &str = "chilli";

#[derive(Debug, Clone, Copy, Default)]
pub struct Chilli;

impl Backend for Chilli {
    fn name(&self) -> &'static str {
        "chilli"
    }

    fn package(&self) -> &'static str {
        PACKAGE
    }

    fn init(&self, ctx: &mut ParseContext<'_>) -> Result<(), CoreError> {
        ctx.open_package(PACKAGE, PackagePolicy::MustExist, |_| 0)
    }

    fn process(&self, ctx: &mut ParseContext<'_>) -> Result<(), CoreError> {
        let settings = PortalSettings::from_payload(&ctx.payload())?;

        let existing = ctx
            .package()?
            .resolve(&SectionRef::first_of(SECTION_TYPE))
            .map(|s| s.name().to_owned());
        let section = match existing {
            Some(name) => name,
            None => ctx.new_anonymous_section(SECTION_TYPE)?,
        };
        settings.stage(ctx, &section)
    }
}
