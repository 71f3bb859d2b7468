//!
//! Segment model: states, transitions and the library of penalty functions
//!
//! The model is a `petgraph` directed graph. A node is a hidden state with
//! initial/final scores and optional ORF phases. An edge `i -> j` is a
//! transition with a scalar weight and an ordered list of penalty functions
//! (indices into the library) whose values are added to the weight.
//!
use crate::common::{Pos, Score};
use crate::orf::{OrfPhases, StateOrf};
use crate::plif::{Penalty, Plif};
use derive_new::new;
use itertools::Itertools;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

///
/// Hidden state
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct StateNode {
    pub name: String,
    /// score of starting in this state
    pub init_score: Score,
    /// score of ending in this state
    pub final_score: Score,
    #[serde(default)]
    #[new(default)]
    pub orf: StateOrf,
}

impl StateNode {
    pub fn with_orf(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.orf = StateOrf { from, to };
        self
    }
}

///
/// Transition
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct TransEdge {
    pub weight: Score,
    /// indices of penalty functions in the library, summed in this order
    #[serde(default)]
    pub penalties: Vec<usize>,
}

///
/// Segment model
///
#[derive(Debug, Clone)]
pub struct SegmentModel<P: Penalty = Plif> {
    pub graph: DiGraph<StateNode, TransEdge>,
    pub penalties: Vec<P>,
}

///
/// Predecessor of a state, as seen by the decoder
///
#[derive(Debug, Clone)]
pub struct Predecessor<'a, P: Penalty> {
    pub edge: EdgeIndex,
    /// index of the source state
    pub state: usize,
    pub weight: Score,
    pub penalties: Vec<&'a P>,
    pub orf: Option<OrfPhases>,
}

impl<'a, P: Penalty> Predecessor<'a, P> {
    ///
    /// Look-back bound of the transition: the largest `max_len` of its
    /// penalty functions, or `default` if it has none.
    ///
    pub fn look_back(&self, default: Pos) -> Pos {
        self.penalties
            .iter()
            .map(|p| p.max_len())
            .max()
            .unwrap_or(default)
    }
}

impl<P: Penalty> SegmentModel<P> {
    pub fn new(penalties: Vec<P>) -> Self {
        SegmentModel {
            graph: DiGraph::new(),
            penalties,
        }
    }
    pub fn add_state(&mut self, state: StateNode) -> NodeIndex {
        self.graph.add_node(state)
    }
    ///
    /// Add a transition `from -> to`.
    ///
    /// Transitions into a state are visited by the decoder in the order they
    /// were added.
    ///
    pub fn add_transition(&mut self, from: NodeIndex, to: NodeIndex, edge: TransEdge) -> EdgeIndex {
        for &p in edge.penalties.iter() {
            assert!(
                p < self.penalties.len(),
                "penalty function index {} is out of the library",
                p
            );
        }
        self.graph.add_edge(from, to, edge)
    }
    /// the number of states
    pub fn n_states(&self) -> usize {
        self.graph.node_count()
    }
    /// the number of transitions
    pub fn n_transitions(&self) -> usize {
        self.graph.edge_count()
    }
    pub fn state(&self, state: usize) -> &StateNode {
        &self.graph[NodeIndex::new(state)]
    }
    /// iterator of `(index, state)`
    pub fn states(&self) -> impl Iterator<Item = (usize, &StateNode)> + '_ {
        self.graph
            .node_indices()
            .map(move |v| (v.index(), &self.graph[v]))
    }
    pub fn initial_state_score(&self, state: usize) -> Score {
        self.state(state).init_score
    }
    pub fn final_state_score(&self, state: usize) -> Score {
        self.state(state).final_score
    }
    pub fn orf_metadata(&self, state: usize) -> &StateOrf {
        &self.state(state).orf
    }
    ///
    /// Transitions into `state` in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if a transition carries ORF phases on only one side.
    ///
    pub fn forward_adjacency(&self, state: usize) -> Vec<Predecessor<'_, P>> {
        let target = NodeIndex::new(state);
        self.graph
            .edges_directed(target, Direction::Incoming)
            .sorted_by_key(|e| e.id())
            .map(|e| {
                let source = e.source();
                let edge = e.weight();
                Predecessor {
                    edge: e.id(),
                    state: source.index(),
                    weight: edge.weight,
                    penalties: edge.penalties.iter().map(|&p| &self.penalties[p]).collect(),
                    orf: OrfPhases::of_transition(&self.graph[source].orf, &self.graph[target].orf),
                }
            })
            .collect()
    }
    ///
    /// Penalty functions of the transition `from -> to` (the first one
    /// added, if there are parallel transitions).
    ///
    pub fn transition(&self, from: usize, to: usize) -> Option<&TransEdge> {
        self.graph
            .edges_connecting(NodeIndex::new(from), NodeIndex::new(to))
            .min_by_key(|e| e.id())
            .map(|e| e.weight())
    }
    ///
    /// The number of decomposition buckets of penalty ids, i.e. the largest
    /// id plus one.
    ///
    pub fn n_penalty_ids(&self) -> usize {
        self.penalties.iter().map(|p| p.id() + 1).max().unwrap_or(0)
    }
    /// the largest `max_len` over the whole library
    pub fn max_penalty_len(&self) -> Option<Pos> {
        self.penalties.iter().map(|p| p.max_len()).max()
    }
    /// check if any penalty function reads SVM outputs
    pub fn uses_svm(&self) -> bool {
        self.penalties.iter().any(|p| p.uses_svm())
    }
    pub fn penalty_names(&self) -> Vec<(usize, &str)> {
        self.penalties.iter().map(|p| (p.id(), p.name())).collect()
    }
}

//
// serialization
//

///
/// Transition of a `ModelSpec`
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub from: usize,
    pub to: usize,
    #[serde(flatten)]
    pub edge: TransEdge,
}

///
/// Serializable description of a `SegmentModel<Plif>`
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub states: Vec<StateNode>,
    pub transitions: Vec<TransitionSpec>,
    #[serde(default)]
    pub penalties: Vec<Plif>,
}

impl ModelSpec {
    pub fn to_json_file<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

impl SegmentModel<Plif> {
    ///
    /// Build the model, validating and caching every penalty function.
    ///
    pub fn from_spec(spec: ModelSpec) -> Self {
        let penalties = spec
            .penalties
            .into_iter()
            .map(|mut p| {
                p.validate();
                p.init_cache();
                p
            })
            .collect();
        let mut model = SegmentModel::new(penalties);
        let nodes: Vec<NodeIndex> = spec.states.into_iter().map(|s| model.add_state(s)).collect();
        for t in spec.transitions {
            assert!(
                t.from < nodes.len() && t.to < nodes.len(),
                "transition {} -> {} refers to an unknown state",
                t.from,
                t.to
            );
            model.add_transition(nodes[t.from], nodes[t.to], t.edge);
        }
        model
    }
    pub fn to_spec(&self) -> ModelSpec {
        ModelSpec {
            states: self.graph.node_weights().cloned().collect(),
            transitions: self
                .graph
                .edge_references()
                .map(|e| TransitionSpec {
                    from: e.source().index(),
                    to: e.target().index(),
                    edge: e.weight().clone(),
                })
                .collect(),
            penalties: self.penalties.clone(),
        }
    }
    pub fn from_json_file<Q: AsRef<std::path::Path>>(path: Q) -> std::io::Result<Self> {
        Ok(SegmentModel::from_spec(ModelSpec::from_json_file(path)?))
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ni;

    fn model() -> SegmentModel {
        let mut m = SegmentModel::new(vec![
            Plif::constant(0, "short", -1.0, 0, 10),
            Plif::constant(2, "long", -2.0, 0, 100),
        ]);
        let a = m.add_state(StateNode::new("a".to_string(), 0.0, 0.0));
        let b = m.add_state(StateNode::new("b".to_string(), -1.0, 0.0));
        let c = m.add_state(StateNode::new("c".to_string(), -1.0, 0.0));
        m.add_transition(c, b, TransEdge::new(-0.5, vec![]));
        m.add_transition(a, b, TransEdge::new(0.0, vec![1, 0]));
        m.add_transition(b, b, TransEdge::new(0.0, vec![0]));
        m
    }

    #[test]
    fn adjacency_in_insertion_order() {
        let m = model();
        let preds = m.forward_adjacency(1);
        assert_eq!(
            preds.iter().map(|p| p.state).collect::<Vec<_>>(),
            vec![2, 0, 1]
        );
        assert_eq!(preds[1].penalties[0].name, "long");
        assert_eq!(preds[1].penalties[1].name, "short");
        assert_eq!(preds[0].look_back(30000), 30000);
        assert_eq!(preds[1].look_back(30000), 100);
        assert_eq!(preds[2].look_back(30000), 10);
        assert!(m.forward_adjacency(0).is_empty());
    }

    #[test]
    fn library_properties() {
        let m = model();
        assert_eq!(m.n_penalty_ids(), 3);
        assert_eq!(m.max_penalty_len(), Some(100));
        assert!(!m.uses_svm());
        assert_eq!(m.transition(0, 1).map(|e| e.penalties.len()), Some(2));
        assert!(m.transition(1, 0).is_none());
    }

    #[test]
    #[should_panic]
    fn one_sided_orf_is_fatal() {
        let mut m: SegmentModel = SegmentModel::new(vec![]);
        let a = m.add_state(StateNode::new("a".to_string(), 0.0, 0.0).with_orf(Some(0), None));
        let b = m.add_state(StateNode::new("b".to_string(), 0.0, 0.0));
        m.add_transition(a, b, TransEdge::new(0.0, vec![]));
        m.forward_adjacency(b.index());
    }

    #[test]
    #[should_panic]
    fn unknown_penalty_is_fatal() {
        let mut m: SegmentModel = SegmentModel::new(vec![]);
        m.add_transition(ni(0), ni(0), TransEdge::new(0.0, vec![0]));
    }

    #[test]
    fn spec_json_round_trip() {
        let m = model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        m.to_spec().to_json_file(&path).unwrap();
        let m2 = SegmentModel::from_json_file(&path).unwrap();
        assert_eq!(m2.n_states(), 3);
        assert_eq!(m2.n_transitions(), 3);
        assert!(m2.penalties.iter().all(|p| p.has_cache()));
        assert_eq!(
            m2.forward_adjacency(1)
                .iter()
                .map(|p| (p.state, p.weight))
                .collect::<Vec<_>>(),
            vec![(2, -0.5), (0, 0.0), (1, 0.0)]
        );
    }
}
