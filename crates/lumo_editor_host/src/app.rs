// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host application: owns the graph and drives the frame loop.

use crate::project::{HostSettings, ProjectFile};
use lumo_editor_graph::nodes::{blur, output, scene_merger, texture};
use lumo_editor_graph::{
    create_core_registry, CameraState, CommandLog, FrameActionQueue, FrameReport, Graph, NodeId,
    NodeRegistry, PluginManager, SlotDirection,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Headless host
pub struct HostApp {
    registry: NodeRegistry,
    plugins: PluginManager,
    settings: HostSettings,
    graph: Rc<RefCell<Graph>>,
    actions: Rc<FrameActionQueue>,
    log: CommandLog,
    frame: u32,
}

impl HostApp {
    /// Load a project. Plugin node types are installed after the built-in
    /// ones, before the graph is read.
    pub fn new(project: &ProjectFile, plugins: PluginManager) -> Self {
        let mut registry = create_core_registry();
        let added = plugins.install_into(&mut registry);
        tracing::debug!("{} node types ({added} from plugins)", registry.len());

        let (graph, issues) =
            Graph::from_document(&project.graph, &registry, project.settings.graph.clone());
        for issue in &issues {
            tracing::warn!("load: {issue}");
        }

        let app = Self {
            registry,
            plugins,
            settings: project.settings.clone(),
            graph: Rc::new(RefCell::new(graph)),
            actions: Rc::new(FrameActionQueue::new()),
            log: CommandLog::default(),
            frame: 0,
        };
        app.queue_viewport_resize(app.settings.viewport_size);
        app
    }

    /// Resize the graph targets on the next tick
    pub fn queue_viewport_resize(&self, size: [u32; 2]) {
        let graph = Rc::clone(&self.graph);
        self.actions.add(move || {
            // Retry next frame if the graph is busy
            let Ok(mut graph) = graph.try_borrow_mut() else {
                return false;
            };
            let changed = graph.resize(size);
            tracing::info!("viewport resized to {}x{} ({changed} nodes)", size[0], size[1]);
            true
        });
    }

    /// Move the camera; camera-driven nodes are updated on the next tick
    #[allow(dead_code)] // Driven by embedding hosts
    pub fn set_camera(&self, camera: CameraState) {
        let graph = Rc::clone(&self.graph);
        self.actions.insert(move || {
            let Ok(mut graph) = graph.try_borrow_mut() else {
                return false;
            };
            graph.update_camera(&camera);
            true
        });
    }

    /// Run one frame: one deferred action, then the graph
    pub fn run_frame(&mut self) -> FrameReport {
        self.actions.tick();
        self.log.clear();
        let report = self.graph.borrow_mut().execute_frame(self.frame, &mut self.log);
        tracing::debug!(
            "frame {}: {} executed, {} produced, {} skipped, {} commands",
            report.frame,
            report.executed.len(),
            report.produced.len(),
            report.skipped,
            self.log.commands().len()
        );
        for command in self.log.commands() {
            tracing::trace!("  {command}");
        }
        self.frame += 1;
        report
    }

    /// Run the number of frames set in the project
    pub fn run(&mut self) -> Vec<FrameReport> {
        (0..self.settings.frames).map(|_| self.run_frame()).collect()
    }

    /// Current project state
    pub fn to_project(&self) -> ProjectFile {
        ProjectFile {
            version: crate::project::PROJECT_FORMAT_VERSION,
            settings: self.settings.clone(),
            graph: self.graph.borrow().to_document(),
        }
    }

    /// Shared graph
    pub fn graph(&self) -> Rc<RefCell<Graph>> {
        Rc::clone(&self.graph)
    }

    /// Deferred actions
    pub fn actions(&self) -> &FrameActionQueue {
        &self.actions
    }

    /// Node types available to this host
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Loaded plugins
    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    /// Commands recorded by the last frame
    pub fn last_commands(&self) -> &[String] {
        self.log.commands()
    }
}

/// Texture, blur and viewport output, with the blur passes merged into a
/// scene merger
pub fn demo_graph(registry: &NodeRegistry) -> Graph {
    let mut graph = Graph::new("demo");
    let add = |graph: &mut Graph, type_id: &str, x: f32| -> Option<NodeId> {
        let node = registry.create_node(type_id)?.with_position(x, 0.0);
        Some(graph.add_node(node))
    };
    let ids = (
        add(&mut graph, texture::TEXTURE_2D, 0.0),
        add(&mut graph, blur::BLUR, 200.0),
        add(&mut graph, scene_merger::SCENE_MERGER, 400.0),
        add(&mut graph, output::OUTPUT_3D, 400.0),
    );
    let (Some(source), Some(blur), Some(merger), Some(output)) = ids else {
        tracing::error!("core node types missing from the registry");
        return graph;
    };

    for (from, out, to, input) in [
        (source, "Output", blur, "Input"),
        (blur, "Output", output, "Input"),
        (blur, "Passes", merger, "Passes"),
    ] {
        let endpoints = graph
            .find_slot(from, out, SlotDirection::Output)
            .zip(graph.find_slot(to, input, SlotDirection::Input));
        let Some((a, b)) = endpoints else {
            tracing::error!("demo slot {out} or {input} missing");
            continue;
        };
        if let Err(e) = graph.connect(a, b) {
            tracing::error!("demo link {out} -> {input} refused: {e}");
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_project() -> ProjectFile {
        let registry = create_core_registry();
        let mut project = ProjectFile::new(demo_graph(&registry).to_document());
        project.settings.viewport_size = [320, 200];
        project
    }

    #[test]
    fn test_demo_graph_is_complete() {
        let graph = demo_graph(&create_core_registry());
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.link_count(), 3);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_resize_runs_on_first_tick() {
        let mut app = HostApp::new(&demo_project(), PluginManager::new());
        assert_eq!(app.actions().len(), 1);

        app.run_frame();

        assert!(app.actions().is_empty());
        assert!(app.last_commands().iter().any(|c| c == "present 320x200"));
    }

    #[test]
    fn test_run_executes_each_frame() {
        let mut project = demo_project();
        project.settings.frames = 4;
        let mut app = HostApp::new(&project, PluginManager::new());

        let reports = app.run();

        assert_eq!(reports.len(), 4);
        assert_eq!(reports.iter().map(|r| r.frame).collect::<Vec<_>>(), [0, 1, 2, 3]);
        assert!(reports.iter().all(|r| !r.executed.is_empty()));
    }

    #[test]
    fn test_project_survives_reload() {
        let app = HostApp::new(&demo_project(), PluginManager::new());
        let saved = app.to_project();
        let text = saved.to_ron().unwrap();
        let reloaded = HostApp::new(&ProjectFile::from_ron(&text).unwrap(), PluginManager::new());

        let graph = reloaded.graph();
        let graph = graph.borrow();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.link_count(), 3);
    }

    #[test]
    fn test_camera_update_is_deferred() {
        let mut app = HostApp::new(&demo_project(), PluginManager::new());
        let mut camera = CameraState::default();
        camera.view[3][2] = -3.0;
        app.set_camera(camera);

        // Inserted at the front, ahead of the resize
        assert_eq!(app.actions().len(), 2);
        app.run_frame();
        assert_eq!(app.actions().len(), 1);
    }
}
