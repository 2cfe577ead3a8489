//! Deployer setup: turns a parsed deployer file into a [`Deployer`] with its
//! applications registered and built-in handlers connected.
//!
//! Registration happens once, before any deployment runs.

use std::rc::Rc;

use crate::application::handlers::{FileInstaller, LauncherInstaller, ProxyRouter, SourceArchive};
use crate::application::ports::CommandRunner;
use crate::application::services::deployer::Deployer;
use crate::application::signals::{AppFilter, LifecycleEvent, LifecycleHandler};
use crate::domain::config::DeployerConfig;

/// Build the deployer described by `config`.
///
/// Per application, handlers are connected in this order: source archive,
/// launcher, files, proxy. One source-archive handler is shared by every
/// application that asks for it; `runner` executes its local `git archive`.
pub fn build_deployer<R>(config: &DeployerConfig, runner: R) -> Deployer
where
    R: CommandRunner + 'static,
{
    let mut deployer = Deployer::new(&config.name, config.env.clone());
    let source: Rc<dyn LifecycleHandler> = Rc::new(SourceArchive::new(runner));

    for app in &config.applications {
        deployer.add_application(&app.name, app.options());
        let filter = AppFilter::app(&app.name);

        if app.source_archive {
            deployer.on(LifecycleEvent::Install, filter.clone(), Rc::clone(&source));
        }

        if app.runrc.is_some() || app.launcher.is_some() {
            let launcher = Rc::new(LauncherInstaller::new(
                app.runrc.clone(),
                app.launcher.clone(),
            ));
            deployer.on(LifecycleEvent::Install, filter.clone(), launcher);
        }

        if !app.dirs.is_empty() || !app.files.is_empty() {
            let files = Rc::new(FileInstaller::new(app.dirs.clone(), app.files.clone()));
            deployer.on(LifecycleEvent::Install, filter.clone(), files);
        }

        if let Some(proxy) = &app.proxy {
            let router: Rc<dyn LifecycleHandler> = Rc::new(ProxyRouter::new(proxy.clone()));
            for event in ProxyRouter::EVENTS {
                deployer.on(event, filter.clone(), Rc::clone(&router));
            }
        }

        tracing::debug!(deployer = %config.name, app = %app.name, "application registered");
    }
    deployer
}
