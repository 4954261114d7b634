//! 画面分割ツリー
//!
//! 葉は `View` の番号を持ち、内部ノードは領域を2つに分ける。ノードはアリーナに置き、
//! 親子関係はキーで持つ（方向移動のために親への参照が要る）。

use ratatui::{buffer::Buffer, layout::Rect};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;
use tracing::{debug, trace};

use super::View;
use crate::ui::Theme;

new_key_type! {
    /// レイアウトツリーのノードID
    pub struct NodeId;
}

/// 分割の向き
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    /// 幅を分けて左右に並べる
    Horizontal,
    /// 高さを分けて上下に並べる
    Vertical,
}

/// フォーカス移動の方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn axis(self) -> SplitAxis {
        match self {
            Direction::Up | Direction::Down => SplitAxis::Vertical,
            Direction::Left | Direction::Right => SplitAxis::Horizontal,
        }
    }

    /// 後ろ側（右・下）へ向かう移動か
    fn is_forward(self) -> bool {
        matches!(self, Direction::Down | Direction::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf { view: usize, focused: bool },
    Split { axis: SplitAxis, first: NodeId, second: NodeId },
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("no leaf holds focus")]
    NoFocusedLeaf,
}

/// 領域を軸に沿って二分する。間の1セルは区切り線
///
/// 前側が `n - 1 - (n - 1) / 2`、後ろ側が `(n - 1) / 2` セル。
pub fn bisect(area: Rect, axis: SplitAxis) -> (Rect, Rect) {
    match axis {
        SplitAxis::Horizontal => {
            let (near, far) = halves(area.width);
            (
                Rect { width: near, ..area },
                Rect {
                    x: area.x + area.width - far,
                    width: far,
                    ..area
                },
            )
        }
        SplitAxis::Vertical => {
            let (near, far) = halves(area.height);
            (
                Rect { height: near, ..area },
                Rect {
                    y: area.y + area.height - far,
                    height: far,
                    ..area
                },
            )
        }
    }
}

fn halves(extent: u16) -> (u16, u16) {
    let Some(rest) = extent.checked_sub(1) else {
        return (0, 0);
    };
    let far = rest / 2;
    (rest - far, far)
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.right() && y >= area.y && y < area.bottom()
}

/// 画面分割ツリー。葉のうちちょうど1つがフォーカスを持つ
#[derive(Debug, Clone)]
pub struct LayoutTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl LayoutTree {
    /// `view` を表示する葉1つだけのツリー（フォーカスあり）
    pub fn new(view: usize) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node {
            parent: None,
            kind: NodeKind::Leaf { view, focused: true },
        });
        Self { nodes, root }
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    #[cfg(test)]
    pub(crate) fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(id).map(|n| n.kind)
    }

    #[cfg(test)]
    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// 葉を左（上）から順に列挙
    #[cfg(test)]
    pub(crate) fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    #[cfg(test)]
    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.nodes[id].kind {
            NodeKind::Leaf { .. } => out.push(id),
            NodeKind::Split { first, second, .. } => {
                self.collect_leaves(first, out);
                self.collect_leaves(second, out);
            }
        }
    }

    /// フォーカスを持つ葉を深さ優先（前側の子から）で探す
    pub fn locate_focused_leaf(&self) -> Result<NodeId, LayoutError> {
        self.find_focused(self.root).ok_or(LayoutError::NoFocusedLeaf)
    }

    fn find_focused(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes[id].kind {
            NodeKind::Leaf { focused, .. } => focused.then_some(id),
            NodeKind::Split { first, second, .. } => {
                self.find_focused(first).or_else(|| self.find_focused(second))
            }
        }
    }

    /// フォーカス中の葉が表示している View の番号
    pub fn focused_view(&self) -> Result<usize, LayoutError> {
        let id = self.locate_focused_leaf()?;
        match self.nodes[id].kind {
            NodeKind::Leaf { view, .. } => Ok(view),
            NodeKind::Split { .. } => Err(LayoutError::NoFocusedLeaf),
        }
    }

    /// 部分木の最初（左上）の葉
    fn first_leaf(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Split { first, .. } = self.nodes[id].kind {
            id = first;
        }
        id
    }

    /// 部分木の最後（右下）の葉
    fn last_leaf(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Split { second, .. } = self.nodes[id].kind {
            id = second;
        }
        id
    }

    /// フォーカスを `id` の葉へ移す
    ///
    /// 全ての葉と View のフラグを下ろしてから対象だけを立てる。戻り値は新しい View 番号。
    fn seize_focus(&mut self, id: NodeId, views: &mut [View]) -> usize {
        let id = self.first_leaf(id);
        for node in self.nodes.values_mut() {
            if let NodeKind::Leaf { focused, .. } = &mut node.kind {
                *focused = false;
            }
        }
        let mut view = 0;
        if let NodeKind::Leaf { view: shown, focused } = &mut self.nodes[id].kind {
            *focused = true;
            view = *shown;
        }
        for v in views.iter_mut() {
            v.set_focused(false);
        }
        if let Some(v) = views.get_mut(view) {
            v.set_focused(true);
        }
        trace!(?id, view, "focus moved");
        view
    }

    /// 領域を再帰的に分割して各 View を描画する
    pub fn draw(&self, area: Rect, views: &[View], theme: &Theme, buf: &mut Buffer) {
        self.draw_node(self.root, area, views, theme, buf);
    }

    fn draw_node(&self, id: NodeId, area: Rect, views: &[View], theme: &Theme, buf: &mut Buffer) {
        match self.nodes[id].kind {
            NodeKind::Leaf { view, focused } => {
                if let Some(v) = views.get(view) {
                    v.render(area, buf, theme, focused);
                }
            }
            NodeKind::Split { axis, first, second } => {
                let (near, far) = bisect(area, axis);
                draw_separator(area, near, axis, theme, buf);
                self.draw_node(first, near, views, theme, buf);
                self.draw_node(second, far, views, theme, buf);
            }
        }
    }

    /// クリックを座標の葉へ届ける
    ///
    /// 葉に当たればフォーカスを移し、領域内の座標で View に渡す。戻り値はフォーカス中の View 番号。
    pub fn dispatch_click(&mut self, area: Rect, x: u16, y: u16, views: &mut [View]) -> Option<usize> {
        let mut id = self.root;
        let mut area = area;
        loop {
            if !contains(area, x, y) {
                return None;
            }
            match self.nodes[id].kind {
                NodeKind::Split { axis, first, second } => {
                    let (near, far) = bisect(area, axis);
                    (id, area) = if contains(near, x, y) { (first, near) } else { (second, far) };
                }
                NodeKind::Leaf { view, focused } => {
                    let view = if focused { view } else { self.seize_focus(id, views) };
                    if let Some(v) = views.get_mut(view) {
                        v.click(x - area.x, y - area.y);
                    }
                    return Some(view);
                }
            }
        }
    }

    /// フォーカス中の葉の領域
    pub fn focused_region(&self, area: Rect) -> Result<Rect, LayoutError> {
        let target = self.locate_focused_leaf()?;
        let mut path = Vec::new();
        let mut id = target;
        while let Some(parent) = self.nodes[id].parent {
            path.push((parent, id));
            id = parent;
        }
        let mut area = area;
        for (parent, child) in path.into_iter().rev() {
            if let NodeKind::Split { axis, first, .. } = self.nodes[parent].kind {
                let (near, far) = bisect(area, axis);
                area = if child == first { near } else { far };
            }
        }
        Ok(area)
    }

    /// フォーカス中の葉を分割する
    ///
    /// 両方の子は同じ View を表示し、前側の子がフォーカスを引き継ぐ。
    pub fn split(&mut self, axis: SplitAxis) -> Result<NodeId, LayoutError> {
        let id = self.locate_focused_leaf()?;
        let NodeKind::Leaf { view, .. } = self.nodes[id].kind else {
            return Err(LayoutError::NoFocusedLeaf);
        };
        let first = self.nodes.insert(Node {
            parent: Some(id),
            kind: NodeKind::Leaf { view, focused: true },
        });
        let second = self.nodes.insert(Node {
            parent: Some(id),
            kind: NodeKind::Leaf { view, focused: false },
        });
        self.nodes[id].kind = NodeKind::Split { axis, first, second };
        debug!(?axis, view, "split pane");
        Ok(first)
    }

    /// フォーカス中の葉を閉じ、兄弟を親の位置に引き上げる
    ///
    /// 兄弟が葉なら親はその View の葉になり、分割なら部分木ごと親に移る。
    /// ルートしかない場合は何もしない。
    pub fn kill_split(&mut self, views: &mut [View]) -> Result<Option<usize>, LayoutError> {
        let id = self.locate_focused_leaf()?;
        let Some(parent) = self.nodes[id].parent else {
            return Ok(None);
        };
        let NodeKind::Split { first, second, .. } = self.nodes[parent].kind else {
            return Ok(None);
        };
        let sibling = if first == id { second } else { first };

        self.nodes.remove(id);
        let Some(promoted) = self.nodes.remove(sibling) else {
            return Ok(None);
        };
        let target = match promoted.kind {
            NodeKind::Leaf { view, .. } => {
                self.nodes[parent].kind = NodeKind::Leaf { view, focused: false };
                parent
            }
            NodeKind::Split { first, second, .. } => {
                self.nodes[first].parent = Some(parent);
                self.nodes[second].parent = Some(parent);
                self.nodes[parent].kind = promoted.kind;
                self.first_leaf(parent)
            }
        };
        let view = self.seize_focus(target, views);
        debug!(view, "killed split");
        Ok(Some(view))
    }

    /// 隣のペインへフォーカスを移す
    ///
    /// 祖先をたどり、向きの合う分割を反対側の子から抜けたところで隣の部分木に入る。
    /// 端にいる場合は何もしない。
    pub fn focus_direction(&mut self, direction: Direction, views: &mut [View]) -> Result<Option<usize>, LayoutError> {
        let mut child = self.locate_focused_leaf()?;
        while let Some(parent) = self.nodes[child].parent {
            if let NodeKind::Split { axis, first, second } = self.nodes[parent].kind {
                if axis == direction.axis() {
                    if direction.is_forward() && child == first {
                        let target = self.first_leaf(second);
                        return Ok(Some(self.seize_focus(target, views)));
                    }
                    if !direction.is_forward() && child == second {
                        let target = self.last_leaf(first);
                        return Ok(Some(self.seize_focus(target, views)));
                    }
                }
            }
            child = parent;
        }
        Ok(None)
    }

    /// フォーカス中の葉の表示を別の View に切り替える
    pub fn set_focused_view(&mut self, view: usize, views: &mut [View]) -> Result<usize, LayoutError> {
        let id = self.locate_focused_leaf()?;
        if let NodeKind::Leaf { view: current, .. } = &mut self.nodes[id].kind {
            *current = view;
        }
        Ok(self.seize_focus(id, views))
    }
}

/// 分割の区切り線を描く
fn draw_separator(area: Rect, near: Rect, axis: SplitAxis, theme: &Theme, buf: &mut Buffer) {
    let style = theme.base().fg(theme.separator);
    match axis {
        SplitAxis::Horizontal if area.width > 0 => {
            let x = near.right();
            for y in area.top()..area.bottom() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char('│').set_style(style);
                }
            }
        }
        SplitAxis::Vertical if area.height > 0 => {
            let y = near.bottom();
            for x in area.left()..area.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char('─').set_style(style);
                }
            }
        }
        _ => {}
    }
}
