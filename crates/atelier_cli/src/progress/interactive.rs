use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use atelier::sync::SyncProgress;
use atelier::upstream::EntityKind;

/// Bars for one entity, added as its phases start.
struct EntityBars {
    fetch: ProgressBar,
    save: Option<ProgressBar>,
    detail: Option<ProgressBar>,
}

/// Interactive progress reporter using indicatif.
///
/// Each entity gets a fetch spinner, then a save bar and a detail bar.
pub struct InteractiveReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<EntityKind, EntityBars>>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    /// A reporter that draws nowhere.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden()),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn entity_bars<'a>(
        &self,
        bars: &'a mut HashMap<EntityKind, EntityBars>,
        entity: EntityKind,
    ) -> &'a mut EntityBars {
        bars.entry(entity).or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_prefix(format!("{:10}", entity.as_str()));
            pb.set_message("Fetching...");
            EntityBars {
                fetch: pb,
                save: None,
                detail: None,
            }
        })
    }

    fn phase_bar(&self, after: &ProgressBar, label: &str, len: usize) -> ProgressBar {
        let pb = self.multi.insert_after(after, ProgressBar::new(len as u64));
        pb.set_style(Self::bar_style());
        pb.set_prefix(format!("{:>10}", label));
        pb
    }

    pub fn handle(&self, event: SyncProgress) {
        let mut bars = self.bars.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SyncProgress::FetchingRecords { entity, .. } => {
                self.entity_bars(&mut bars, entity);
            }

            SyncProgress::FetchedPage {
                entity,
                page,
                total_so_far,
                total,
                ..
            } => {
                let entry = self.entity_bars(&mut bars, entity);
                entry
                    .fetch
                    .set_message(format!("page {page}: {total_so_far}/{total} records"));
            }

            SyncProgress::FetchComplete {
                entity,
                fetched,
                candidates,
                skipped,
            } => {
                let entry = self.entity_bars(&mut bars, entity);
                entry.fetch.finish_with_message(format!(
                    "✓ {fetched} fetched, {candidates} changed, {skipped} unchanged"
                ));
                if candidates > 0 {
                    let pb = self.phase_bar(&entry.fetch, "save", candidates);
                    entry.save = Some(pb);
                }
            }

            SyncProgress::Upserting {
                entity,
                processed,
                total,
                created,
                updated,
            } => {
                let entry = self.entity_bars(&mut bars, entity);
                if let Some(ref pb) = entry.save {
                    pb.set_position(processed as u64);
                    pb.set_message(format!("{created} new, {updated} updated"));
                    if processed == total {
                        pb.finish();
                    }
                }
            }

            SyncProgress::UpsertError { entity, id, error } => {
                self.multi
                    .println(format!("  ✗ {} {id}: {error}", entity.label()))
                    .ok();
            }

            SyncProgress::DetailingRecords { entity, total } => {
                let entry = self.entity_bars(&mut bars, entity);
                let anchor = entry.save.clone().unwrap_or_else(|| entry.fetch.clone());
                let pb = self.phase_bar(&anchor, "detail", total);
                entry.detail = Some(pb);
            }

            SyncProgress::Detailing {
                entity,
                done,
                total,
            } => {
                let entry = self.entity_bars(&mut bars, entity);
                if let Some(ref pb) = entry.detail {
                    pb.set_position(done as u64);
                    if done == total {
                        pb.finish();
                    }
                }
            }

            SyncProgress::DetailError { entity, id, error } => {
                self.multi
                    .println(format!("  ✗ {} detail #{id}: {error}", entity.label()))
                    .ok();
            }

            SyncProgress::EntityComplete {
                entity,
                processed,
                errors,
                ..
            } => {
                let entry = self.entity_bars(&mut bars, entity);
                let summary = if errors > 0 {
                    format!("✓ {processed} saved, {errors} errors")
                } else {
                    format!("✓ {processed} saved")
                };
                finish_all(entry);
                entry.fetch.finish_with_message(summary);
            }

            SyncProgress::Paused { entity } => {
                let entry = self.entity_bars(&mut bars, entity);
                for pb in [Some(&entry.fetch), entry.save.as_ref(), entry.detail.as_ref()]
                    .into_iter()
                    .flatten()
                {
                    if !pb.is_finished() {
                        pb.abandon_with_message("paused");
                    }
                }
            }

            SyncProgress::Warning { message } => {
                self.multi.println(format!("  ! {message}")).ok();
            }

            _ => {}
        }
    }

    /// Show the last heartbeat on every bar that is still running.
    pub fn heartbeat(&self, at: DateTime<Utc>) {
        let bars = self.bars.lock().unwrap_or_else(|e| e.into_inner());
        let stamp = at.with_timezone(&Local).format("%H:%M:%S");
        for entry in bars.values() {
            if !entry.fetch.is_finished() {
                entry.fetch.set_message(format!("still fetching ({stamp})"));
            }
            if let Some(ref pb) = entry.detail
                && !pb.is_finished()
            {
                pb.set_message(format!("alive at {stamp}"));
            }
        }
    }

    pub fn finish(&self) {
        let mut bars = self.bars.lock().unwrap_or_else(|e| e.into_inner());
        for entry in bars.values_mut() {
            finish_all(entry);
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>4}/{len:4} {msg}")
            .expect("Invalid template")
            .progress_chars("█▓░")
    }
}

fn finish_all(entry: &EntityBars) {
    for pb in [Some(&entry.fetch), entry.save.as_ref(), entry.detail.as_ref()]
        .into_iter()
        .flatten()
    {
        if !pb.is_finished() {
            pb.finish();
        }
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
