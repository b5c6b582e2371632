use std::env;

use stead_core::*;
use stead_store::*;

record! {
    pub struct Toggle => TogglePatch {
        pub is_on: bool,
        pub is_disabled: bool,
    }
}

#[derive(Default)]
struct ToggleConfig {
    on: bool,
}

fn toggle_scope() -> ScopedStore<Toggle, ToggleConfig> {
    create_scope(
        |cfg: &ToggleConfig| Toggle {
            is_on: cfg.on,
            is_disabled: false,
        },
        ActionDefs::<Toggle>::new()
            .patch("on", TogglePatch::default().is_on(true))
            .factory("off", |(): ()| {
                Update::with(|_| Some(TogglePatch::default().is_on(false)))
            })
            .factory("disable", |is_on: bool| {
                Update::with(move |_| Some(TogglePatch::default().is_on(is_on).is_disabled(true)))
            }),
    )
}

fn status(service: &Option<Service<Toggle>>) -> View {
    let Some(service) = service else {
        return Text("no toggle in scope");
    };
    let mut children = vec![Text(format!(
        "on: {}  disabled: {}",
        service.is_on, service.is_disabled
    ))];
    children.extend(service.mutations().iter().map(|m| {
        let m = m.clone();
        Button(m.name().to_owned(), move || m.fire())
    }));
    Fragment(children)
}

/// Usage: `toggle [--on] [action...]`, e.g. `toggle off disable`.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut start_on = false;
    let mut actions = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--on" => start_on = true,
            _ => actions.push(arg),
        }
    }

    let scope = toggle_scope();
    let view = scope.adapter().identity().wrap(status);
    let live = LiveCell::new();

    let forwarded = live.clone();
    let mut composition = Composition::new(move || {
        scope.boundary(
            Boundary::new(ToggleConfig { on: start_on }).live_ref(forwarded.clone()),
            || view.show(),
        )
    });

    let texts = composition.settle()?.texts().join(" | ");
    log::info!("mounted: {texts}");
    if let Some(service) = live.get() {
        log::info!("forwarded service keys: {:?}", service.keys());
    }

    for action in &actions {
        let texts = composition.click(action)?.texts().join(" | ");
        log::info!("after {action}: {texts}");
    }

    composition.unmount();
    log::info!("unmounted; live reference set: {}", live.is_set());
    Ok(())
}
