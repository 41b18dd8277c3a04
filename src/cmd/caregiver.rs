use anyhow::Result;
use serde_json::json;

use doseplan::core::access;
use doseplan::output::human;

use super::Ctx;

pub fn run_link(ctx: &Ctx, caregiver: &str, patient: &str) -> Result<()> {
    let link = access::link_caregiver(&ctx.db, ctx.clock.as_ref(), caregiver, patient)?;
    ctx.emit("caregiver_link", &link, || {
        format!("{} can now manage {}'s schedules", caregiver, patient)
    })
}

pub fn run_unlink(ctx: &Ctx, caregiver: &str, patient: &str) -> Result<()> {
    access::unlink_caregiver(&ctx.db, caregiver, patient)?;
    let data = json!({
        "caregiver_id": caregiver,
        "patient_id": patient,
        "removed": true,
    });
    ctx.emit("caregiver_unlink", &data, || {
        format!("Unlinked {} from {}", caregiver, patient)
    })
}

pub fn run_list(ctx: &Ctx) -> Result<()> {
    let links = access::list_links(&ctx.db, &ctx.user)?;
    let data = json!({
        "user_id": ctx.user,
        "links": links,
        "count": links.len(),
    });
    ctx.emit("caregiver_list", &data, || human::format_links(&links))
}
