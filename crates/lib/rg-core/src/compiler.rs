use std::collections::{HashMap, HashSet, VecDeque};

use crate::access::{AccessKind, AccessRange, QueueKind};
use crate::barrier::{self, BarrierSlot};
use crate::builder::GraphBuilder;
use crate::error::{RgError, RgResult};
use crate::handle::RawHandle;
use crate::pass::{target_raw, Pass, PassAccessTarget};
use crate::resource::{ResourceDescKind, ResourceOrigin, ResourceRegistry};

/// A logical transition of one resource from one access to another. Carries
/// no backend object yet — [`crate::executor::Executor`] resolves `target`
/// to a concrete `DeviceImage`/`DeviceBuffer` once resources are bound for
/// the frame, and only then turns this into an [`crate::barrier::ImageBarrier`]
/// or [`crate::barrier::BufferBarrier`].
#[derive(Clone, Debug)]
pub struct ResourceTransition {
    pub target: PassAccessTarget,
    pub range: AccessRange,
    pub previous: crate::access::AccessInfo,
    pub next: crate::access::AccessInfo,
    pub src_queue: Option<QueueKind>,
    pub dst_queue: Option<QueueKind>,
    pub discard_contents: bool,
}

/// A maximal contiguous run of same-queue passes in submission order.
pub struct PassGroup {
    pub queue: QueueKind,
    pub passes: Vec<u32>,
}

/// The output of the Compiler + Barrier Solver: a frame ready for the
/// Executor to bind resources against and submit, in one immutable bundle.
pub struct CompiledFrame {
    pub(crate) registry: ResourceRegistry,
    pub(crate) passes: Vec<Pass>,
    pub(crate) order: Vec<u32>,
    pub(crate) groups: Vec<PassGroup>,
    pub(crate) prologue: HashMap<u32, Vec<ResourceTransition>>,
    pub(crate) epilogue: HashMap<u32, Vec<ResourceTransition>>,
    pub(crate) resolve: HashMap<u32, Vec<ResourceTransition>>,
    pub(crate) alias_plan: HashMap<u32, u32>,
    pub(crate) swapchain_resource: Option<u32>,
}

impl CompiledFrame {
    pub fn groups(&self) -> &[PassGroup] {
        &self.groups
    }

    pub(crate) fn barriers_for(&self, pass_id: u32, slot: BarrierSlot) -> &[ResourceTransition] {
        let map = match slot {
            BarrierSlot::Prologue => &self.prologue,
            BarrierSlot::Epilogue => &self.epilogue,
            BarrierSlot::Resolve => &self.resolve,
        };
        map.get(&pass_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Which physical alias slot a transient resource was assigned, if any.
    /// `None` for imported/swapchain resources and for transient resources
    /// that were marked exported (never aliased). Mainly useful from
    /// tests that want to assert two resources do or don't share memory.
    pub fn alias_slot_of(&self, raw: crate::handle::RawHandle) -> Option<u32> {
        self.alias_plan.get(&raw.id).copied()
    }

    /// Reads back the final access state of a resource exported via
    /// [`crate::builder::GraphBuilder::export_image`]/`export_buffer`, once
    /// the frame has retired.
    pub fn get_exported_access<K: crate::handle::ResourceKind>(
        &self,
        handle: crate::handle::ExportedHandle<K>,
    ) -> RgResult<AccessKind> {
        self.registry.get_exported_access(handle)
    }
}

/// Compiler: builds the dependency DAG from each resource's access chain,
/// topologically sorts it, assigns passes to queue-contiguous Pass Groups,
/// computes transient aliasing, then hands off to the Barrier Solver
/// (implemented in [`crate::barrier`]) to derive every transition before
/// returning the finished [`CompiledFrame`].
pub fn compile(builder: GraphBuilder) -> RgResult<CompiledFrame> {
    let GraphBuilder { registry, passes } = builder;

    let order = topological_sort(&passes, &registry)?;
    let groups = group_by_queue(&order, &passes);
    let mut chains = resource_access_chains(&order, &passes, &registry);
    let swapchain_resource = registry
        .iter()
        .find(|(_, e)| e.origin == ResourceOrigin::Swapchain)
        .map(|(id, _)| id);

    // No pass declares a `Present` access directly (the Builder's public API
    // only accepts read/write kinds) — the terminal transition to
    // `PRESENT_SRC_KHR` is synthesized here instead, appended to the
    // swapchain resource's chain right after its last real access, so it
    // lands in that same pass's Resolve slot.
    if let Some(resource_id) = swapchain_resource {
        if let Some(chain) = chains.get_mut(&resource_id) {
            if let Some((last_pass_id, target, last_desc)) = chain.last().cloned() {
                let present_desc = crate::access::AccessDescriptor {
                    kind: AccessKind::Present,
                    stages: ash::vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                    range: last_desc.range,
                    load_op: crate::access::LoadOp::DontCare,
                    store_op: crate::access::StoreOp::Store,
                };
                chain.push((last_pass_id, target, present_desc));
            }
        }
    }

    let alias_plan = plan_aliasing(&order, &passes, &registry, &chains);

    let mut prologue: HashMap<u32, Vec<ResourceTransition>> = HashMap::new();
    let mut epilogue: HashMap<u32, Vec<ResourceTransition>> = HashMap::new();
    let mut resolve: HashMap<u32, Vec<ResourceTransition>> = HashMap::new();

    for (resource_id, chain) in &chains {
        let entry = registry.resolve(RawHandle { id: *resource_id, generation: 0 })?;
        let mut previous_info = match entry.origin {
            ResourceOrigin::Transient => barrier::undefined_access_info(),
            ResourceOrigin::Imported => {
                barrier::derive_stage_access(entry.last_access, ash::vk::PipelineStageFlags::TOP_OF_PIPE)
            }
            ResourceOrigin::Swapchain => barrier::undefined_access_info(),
        };
        let mut previous_queue: Option<QueueKind> = None;

        for (step_index, (pass_id, target, desc)) in chain.iter().enumerate() {
            let next_info = barrier::derive_stage_access(desc.kind, desc.stages);
            let pass = passes.iter().find(|p| p.id == *pass_id).expect("pass id from chain must exist");
            let next_queue = pass.queue;

            if barrier::is_noop_transition(previous_info, next_info) && previous_queue == Some(next_queue) {
                previous_info = next_info;
                previous_queue = Some(next_queue);
                continue;
            }

            let crosses_queue = previous_queue.map_or(false, |q| q != next_queue);
            let transition = ResourceTransition {
                target: *target,
                range: desc.range,
                previous: previous_info,
                next: next_info,
                src_queue: previous_queue,
                dst_queue: Some(next_queue),
                discard_contents: step_index == 0 && desc.load_op == crate::access::LoadOp::Clear,
            };

            let is_resolve_or_terminal_present = desc.kind == AccessKind::Resolve
                || (Some(*resource_id) == swapchain_resource && desc.kind == AccessKind::Present);

            if is_resolve_or_terminal_present {
                resolve.entry(*pass_id).or_default().push(transition);
            } else if crosses_queue {
                let producer_pass = chain[step_index - 1].0;
                epilogue.entry(producer_pass).or_default().push(transition.clone());
                prologue.entry(*pass_id).or_default().push(transition);
            } else {
                prologue.entry(*pass_id).or_default().push(transition);
            }

            previous_info = next_info;
            previous_queue = Some(next_queue);
        }
    }

    for barriers in prologue.values_mut() {
        *barriers = dedup_transitions(std::mem::take(barriers));
    }
    for barriers in epilogue.values_mut() {
        *barriers = dedup_transitions(std::mem::take(barriers));
    }
    for barriers in resolve.values_mut() {
        *barriers = dedup_transitions(std::mem::take(barriers));
    }

    Ok(CompiledFrame {
        registry,
        passes,
        order,
        groups,
        prologue,
        epilogue,
        resolve,
        alias_plan,
        swapchain_resource,
    })
}

fn dedup_transitions(transitions: Vec<ResourceTransition>) -> Vec<ResourceTransition> {
    let mut out: Vec<ResourceTransition> = Vec::with_capacity(transitions.len());
    'outer: for t in transitions {
        for existing in out.iter() {
            if existing.target == t.target
                && existing.range == t.range
                && existing.previous == t.previous
                && existing.next == t.next
                && existing.src_queue == t.src_queue
                && existing.dst_queue == t.dst_queue
            {
                continue 'outer;
            }
        }
        out.push(t);
    }
    out
}

/// Builds the dependency DAG from each resource's reads and writes and
/// returns a valid linear extension of it, smallest-pass-id-first among
/// ties so a frame with no reordering pressure comes back in declaration
/// order.
///
/// Edges are derived from access roles, not declaration position: every
/// reader of a resource depends on that resource's last declared writer
/// (a write always wins — matches `ResourceEntry::last_access` tracking a
/// single current state per resource rather than a full history), and
/// successive writers to the same resource are chained in declaration
/// order. Because a reader's producer is resolved by role rather than by
/// "whichever pass happened to run first in the builder", two passes can
/// disagree about ordering across two different resources — pass A
/// writing X and reading Y while pass B writes Y and reads X produces both
/// an A-before-B edge (from X) and a B-before-A edge (from Y) — and Kahn's
/// algorithm below surfaces that as a genuine `CyclicDependency` rather
/// than silently picking one order.
fn topological_sort(passes: &[Pass], registry: &ResourceRegistry) -> RgResult<Vec<u32>> {
    let _ = registry;

    let mut writers: HashMap<u32, Vec<u32>> = HashMap::new();
    let mut readers: HashMap<u32, Vec<u32>> = HashMap::new();

    for pass in passes {
        let mut writes_this_pass: HashSet<u32> = HashSet::new();
        let mut reads_this_pass: HashSet<u32> = HashSet::new();
        for access in &pass.accesses {
            let raw = target_raw(access.target).id;
            if access.desc.kind.is_write() {
                writes_this_pass.insert(raw);
            } else if access.desc.kind.is_read() {
                reads_this_pass.insert(raw);
            }
        }
        for raw in writes_this_pass {
            writers.entry(raw).or_default().push(pass.id);
        }
        for raw in reads_this_pass {
            readers.entry(raw).or_default().push(pass.id);
        }
    }

    let mut edges: HashMap<u32, HashSet<u32>> = HashMap::new();
    let mut in_degree: HashMap<u32, u32> = passes.iter().map(|p| (p.id, 0)).collect();
    let mut add_edge = |edges: &mut HashMap<u32, HashSet<u32>>, in_degree: &mut HashMap<u32, u32>, from: u32, to: u32| {
        if from != to && edges.entry(from).or_default().insert(to) {
            *in_degree.entry(to).or_default() += 1;
        }
    };

    let touched_resources: HashSet<u32> = writers.keys().chain(readers.keys()).copied().collect();
    for raw in touched_resources {
        if let Some(writes) = writers.get(&raw) {
            for pair in writes.windows(2) {
                add_edge(&mut edges, &mut in_degree, pair[0], pair[1]);
            }
            if let Some(reads) = readers.get(&raw) {
                let last_writer = *writes.last().unwrap();
                for &reader in reads {
                    add_edge(&mut edges, &mut in_degree, last_writer, reader);
                }
            }
        }
    }

    let mut ready: VecDeque<u32> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(&id, _)| id)
        .collect::<Vec<_>>()
        .into_iter()
        .collect();
    let mut ready_sorted: Vec<u32> = ready.drain(..).collect();
    ready_sorted.sort_unstable();
    let mut ready: VecDeque<u32> = ready_sorted.into();

    let mut order = Vec::with_capacity(passes.len());
    while let Some(id) = ready.pop_front() {
        order.push(id);
        if let Some(successors) = edges.get(&id) {
            let mut newly_ready = Vec::new();
            for &succ in successors {
                let degree = in_degree.get_mut(&succ).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    newly_ready.push(succ);
                }
            }
            newly_ready.sort_unstable();
            for id in newly_ready {
                // keep the queue sorted so ties resolve to smallest id first
                let pos = ready.iter().position(|&r| r > id).unwrap_or(ready.len());
                ready.insert(pos, id);
            }
        }
    }

    if order.len() != passes.len() {
        return Err(RgError::CyclicDependency(format!(
            "{} of {} passes could not be ordered",
            passes.len() - order.len(),
            passes.len()
        )));
    }

    Ok(order)
}

fn group_by_queue(order: &[u32], passes: &[Pass]) -> Vec<PassGroup> {
    let mut groups: Vec<PassGroup> = Vec::new();
    for &id in order {
        let pass = passes.iter().find(|p| p.id == id).unwrap();
        match groups.last_mut() {
            Some(group) if group.queue == pass.queue => group.passes.push(id),
            _ => groups.push(PassGroup {
                queue: pass.queue,
                passes: vec![id],
            }),
        }
    }
    groups
}

type ChainEntry = (u32, PassAccessTarget, crate::access::AccessDescriptor);

/// For every resource, its accesses in final submission order — the
/// single access chain each resource is tracked through.
fn resource_access_chains(
    order: &[u32],
    passes: &[Pass],
    _registry: &ResourceRegistry,
) -> HashMap<u32, Vec<ChainEntry>> {
    let mut chains: HashMap<u32, Vec<ChainEntry>> = HashMap::new();
    for &id in order {
        let pass = passes.iter().find(|p| p.id == id).unwrap();
        for access in &pass.accesses {
            let raw = target_raw(access.target).id;
            chains
                .entry(raw)
                .or_default()
                .push((id, access.target, access.desc.clone()));
        }
    }
    chains
}

/// Transient aliasing: resources created (not imported) by the graph
/// whose access chains don't overlap in submission order can share one
/// physical allocation. Compatibility is resolved as the union of usage
/// flags at allocation time, narrowed to whatever each alias's own barrier
/// demands — the safer reading, since an alias slot must support the union
/// of everything ever assigned to it.
fn plan_aliasing(
    order: &[u32],
    passes: &[Pass],
    registry: &ResourceRegistry,
    chains: &HashMap<u32, Vec<ChainEntry>>,
) -> HashMap<u32, u32> {
    let pass_position: HashMap<u32, usize> = order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let _ = passes;

    struct Lifetime {
        resource_id: u32,
        first: usize,
        last: usize,
        desc: ResourceDescKind,
    }

    let mut lifetimes: Vec<Lifetime> = Vec::new();
    for (&resource_id, chain) in chains {
        let entry = match registry.resolve(RawHandle { id: resource_id, generation: 0 }) {
            Ok(e) => e,
            Err(_) => continue,
        };
        if entry.origin != ResourceOrigin::Transient || entry.exported {
            continue;
        }
        let positions: Vec<usize> = chain.iter().map(|(pid, ..)| pass_position[pid]).collect();
        if let (Some(&first), Some(&last)) = (positions.iter().min(), positions.iter().max()) {
            lifetimes.push(Lifetime {
                resource_id,
                first,
                last,
                desc: entry.desc.clone(),
            });
        }
    }
    lifetimes.sort_by_key(|l| l.first);

    struct Slot {
        id: u32,
        free_at: usize,
        desc: ResourceDescKind,
    }

    let mut slots: Vec<Slot> = Vec::new();
    let mut alias_plan = HashMap::new();
    let mut next_slot_id = 0u32;

    for lifetime in lifetimes {
        let compatible_slot = slots
            .iter_mut()
            .find(|slot| slot.free_at <= lifetime.first && descs_compatible(&slot.desc, &lifetime.desc));

        match compatible_slot {
            Some(slot) => {
                slot.free_at = lifetime.last + 1;
                slot.desc = union_desc(&slot.desc, &lifetime.desc);
                alias_plan.insert(lifetime.resource_id, slot.id);
            }
            None => {
                let id = next_slot_id;
                next_slot_id += 1;
                slots.push(Slot {
                    id,
                    free_at: lifetime.last + 1,
                    desc: lifetime.desc.clone(),
                });
                alias_plan.insert(lifetime.resource_id, id);
            }
        }
    }

    alias_plan
}

fn descs_compatible(a: &ResourceDescKind, b: &ResourceDescKind) -> bool {
    match (a, b) {
        (ResourceDescKind::Image(a), ResourceDescKind::Image(b)) => {
            a.width == b.width && a.height == b.height && a.depth == b.depth && a.format == b.format
        }
        (ResourceDescKind::Buffer(a), ResourceDescKind::Buffer(b)) => a.size == b.size,
        _ => false,
    }
}

fn union_desc(a: &ResourceDescKind, b: &ResourceDescKind) -> ResourceDescKind {
    match (a, b) {
        (ResourceDescKind::Image(a), ResourceDescKind::Image(b)) => {
            let mut merged = a.clone();
            merged.usage |= b.usage;
            ResourceDescKind::Image(merged)
        }
        (ResourceDescKind::Buffer(a), ResourceDescKind::Buffer(b)) => {
            let mut merged = a.clone();
            merged.usage |= b.usage;
            ResourceDescKind::Buffer(merged)
        }
        _ => a.clone(),
    }
}
