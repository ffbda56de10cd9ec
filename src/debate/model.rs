use std::collections::HashMap;

/// The closed set of node roles in a debate graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Subject,
    Position,
    InFavor,
    Against,
    Entity,
    Cluster,
}

impl NodeKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "SUBJECT" => Some(Self::Subject),
            "POSITION" => Some(Self::Position),
            "INFAVOR" => Some(Self::InFavor),
            "AGAINST" => Some(Self::Against),
            "ENTITY" => Some(Self::Entity),
            "CLUSTER" => Some(Self::Cluster),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Subject => "SUBJECT",
            Self::Position => "POSITION",
            Self::InFavor => "INFAVOR",
            Self::Against => "AGAINST",
            Self::Entity => "KEYWORD",
            Self::Cluster => "ARGUMENT CLUSTER",
        }
    }

    pub fn is_argument(self) -> bool {
        matches!(self, Self::InFavor | Self::Against)
    }
}

/// Relation kinds carried by edges. Anything the input does not name
/// explicitly collapses to the structural default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    HasPosition,
    Mention,
    Structural,
}

impl RelationKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "HAS_POSITION" => Self::HasPosition,
            "MENTION" => Self::Mention,
            _ => Self::Structural,
        }
    }

    /// Link stiffness: structural edges hold their distance, mentions
    /// stay loose.
    pub fn strength(self) -> f32 {
        match self {
            Self::HasPosition => 0.7,
            Self::Mention => 0.2,
            Self::Structural => 0.4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DebateNode {
    pub id: String,
    pub kind: NodeKind,
    pub title: String,
    pub text: String,
    /// Keyword surface form for entities, empty otherwise.
    pub value: String,
    pub tagline: String,
    pub summary: String,
    pub author_id: Option<String>,
    /// Conceptual degree for entities, structural degree for everything
    /// else. Fixed once the deduplicated edge set is known.
    pub degree: u32,
    /// Epoch millis; None until the propagator has run.
    pub timestamp: Option<i64>,
}

#[derive(Clone, Copy, Debug)]
pub struct DebateEdge {
    pub source: usize,
    pub target: usize,
    pub relation: RelationKind,
}

#[derive(Clone, Debug)]
pub struct DebateGraph {
    pub nodes: Vec<DebateNode>,
    pub edges: Vec<DebateEdge>,
    pub index_by_id: HashMap<String, usize>,
    /// Adjacency over the deduplicated edge set.
    pub neighbors: Vec<Vec<usize>>,
    /// Cluster node index -> member node indices (non-cluster endpoints).
    pub cluster_members: Vec<(usize, Vec<usize>)>,
    /// Member node index -> owning cluster index.
    pub cluster_of: Vec<Option<usize>>,
    pub subject: Option<usize>,
    pub time_domain: (i64, i64),
    max_entity_degree: u32,
    max_structural_degree: u32,
}

impl DebateGraph {
    pub fn new(nodes: Vec<DebateNode>, edges: Vec<DebateEdge>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut neighbors = vec![Vec::new(); nodes.len()];
        for edge in &edges {
            neighbors[edge.source].push(edge.target);
            neighbors[edge.target].push(edge.source);
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        let subject = nodes.iter().position(|node| node.kind == NodeKind::Subject);

        let mut graph = Self {
            cluster_of: vec![None; nodes.len()],
            nodes,
            edges,
            index_by_id,
            neighbors,
            cluster_members: Vec::new(),
            subject,
            time_domain: (0, 0),
            max_entity_degree: 0,
            max_structural_degree: 0,
        };
        graph.compute_degrees();
        graph.collect_cluster_members();
        graph
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, index: usize) -> NodeKind {
        self.nodes[index].kind
    }

    /// Display text for a node: keyword value for entities, cluster
    /// tagline for clusters, the record title otherwise.
    pub fn display_title(&self, index: usize) -> &str {
        let node = &self.nodes[index];
        match node.kind {
            NodeKind::Entity if !node.value.is_empty() => &node.value,
            NodeKind::Cluster if !node.tagline.is_empty() => &node.tagline,
            _ => &node.title,
        }
    }

    /// Entity degree counts every incident edge; everything else counts
    /// only edges to non-entity partners.
    fn compute_degrees(&mut self) {
        let mut structural = vec![0u32; self.nodes.len()];
        let mut conceptual = vec![0u32; self.nodes.len()];

        for edge in &self.edges {
            let source_entity = self.nodes[edge.source].kind == NodeKind::Entity;
            let target_entity = self.nodes[edge.target].kind == NodeKind::Entity;
            if source_entity || target_entity {
                conceptual[edge.source] += 1;
                conceptual[edge.target] += 1;
            } else {
                structural[edge.source] += 1;
                structural[edge.target] += 1;
            }
        }

        self.max_entity_degree = 0;
        self.max_structural_degree = 0;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.kind == NodeKind::Entity {
                node.degree = conceptual[index];
                self.max_entity_degree = self.max_entity_degree.max(node.degree);
            } else {
                node.degree = structural[index];
                self.max_structural_degree = self.max_structural_degree.max(node.degree);
            }
        }
    }

    fn collect_cluster_members(&mut self) {
        let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
        for index in 0..self.nodes.len() {
            if self.nodes[index].kind == NodeKind::Cluster {
                members.insert(index, Vec::new());
            }
        }

        for edge in &self.edges {
            if self.nodes[edge.source].kind == NodeKind::Cluster
                && self.nodes[edge.target].kind != NodeKind::Cluster
            {
                if let Some(list) = members.get_mut(&edge.source) {
                    list.push(edge.target);
                }
            }
            if self.nodes[edge.target].kind == NodeKind::Cluster
                && self.nodes[edge.source].kind != NodeKind::Cluster
            {
                if let Some(list) = members.get_mut(&edge.target) {
                    list.push(edge.source);
                }
            }
        }

        let mut cluster_members = members.into_iter().collect::<Vec<_>>();
        cluster_members.sort_unstable_by_key(|(cluster, _)| *cluster);
        for (_, list) in &mut cluster_members {
            list.sort_unstable();
            list.dedup();
        }

        self.cluster_of = vec![None; self.nodes.len()];
        for (cluster, list) in &cluster_members {
            for &member in list {
                self.cluster_of[member] = Some(*cluster);
            }
        }
        self.cluster_members = cluster_members;
    }

    pub fn members_of(&self, cluster: usize) -> &[usize] {
        self.cluster_members
            .iter()
            .find(|(index, _)| *index == cluster)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }

    /// Drawn radius in world units. Subjects are fixed, positions grow
    /// with their argument count, entities stay small.
    pub fn visual_radius(&self, index: usize) -> f32 {
        let node = &self.nodes[index];
        let degree = node.degree as f32;
        match node.kind {
            NodeKind::Subject => 50.0,
            NodeKind::Cluster => 0.0,
            NodeKind::Position => (8.0 + degree * 3.5).min(48.0),
            NodeKind::Entity => {
                let max = self.max_entity_degree.max(1) as f32;
                2.0 + (degree / max) * 6.0
            }
            NodeKind::InFavor | NodeKind::Against => {
                let max = self.max_structural_degree.max(1) as f32;
                12.0 + (degree / max) * 33.0
            }
        }
    }

    /// Pro/con counts over a position's direct argument neighbors.
    pub fn argument_balance(&self, position: usize) -> (usize, usize) {
        let mut pro = 0;
        let mut con = 0;
        for &neighbor in &self.neighbors[position] {
            match self.nodes[neighbor].kind {
                NodeKind::InFavor => pro += 1,
                NodeKind::Against => con += 1,
                _ => {}
            }
        }
        (pro, con)
    }

    /// Member balance of a cluster: (in favor, against).
    pub fn cluster_balance(&self, cluster: usize) -> (usize, usize) {
        let mut pro = 0;
        let mut con = 0;
        for &member in self.members_of(cluster) {
            match self.nodes[member].kind {
                NodeKind::InFavor => pro += 1,
                NodeKind::Against => con += 1,
                _ => {}
            }
        }
        (pro, con)
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    pub(crate) fn node(id: &str, kind: NodeKind) -> DebateNode {
        DebateNode {
            id: id.to_string(),
            kind,
            title: id.to_string(),
            text: String::new(),
            value: String::new(),
            tagline: String::new(),
            summary: String::new(),
            author_id: None,
            degree: 0,
            timestamp: None,
        }
    }

    pub(crate) fn edge(source: usize, target: usize, relation: RelationKind) -> DebateEdge {
        DebateEdge {
            source,
            target,
            relation,
        }
    }

    /// S(0) - P1(1) - {A1(2) infavor, A2(3) against}, E(4) entity on A1,
    /// C(5) cluster over A1/A2.
    pub(crate) fn small_debate() -> DebateGraph {
        let nodes = vec![
            node("s", NodeKind::Subject),
            node("p1", NodeKind::Position),
            node("a1", NodeKind::InFavor),
            node("a2", NodeKind::Against),
            node("e", NodeKind::Entity),
            node("c", NodeKind::Cluster),
        ];
        let edges = vec![
            edge(0, 1, RelationKind::HasPosition),
            edge(1, 2, RelationKind::Structural),
            edge(1, 3, RelationKind::Structural),
            edge(2, 4, RelationKind::Mention),
            edge(5, 2, RelationKind::Structural),
            edge(5, 3, RelationKind::Structural),
        ];
        DebateGraph::new(nodes, edges)
    }
}
