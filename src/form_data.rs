use std::collections::HashMap;
use std::io::{self, Read};

/// Content-Type が宣言されていないファイルパートの Content-Type
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// リクエストボディから読み取ったフォームデータ
///
/// 同じ名前が `fields` と `files` の両方に現れることはない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, FormFile>,
}

impl FormData {
    /// テキストフィールドの値を取得
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// ファイルを取得
    pub fn file(&self, name: &str) -> Option<&FormFile> {
        self.files.get(name)
    }

    /// ファイルを可変参照で取得 (読み取りカーソルを進める場合に使う)
    pub fn file_mut(&mut self, name: &str) -> Option<&mut FormFile> {
        self.files.get_mut(name)
    }

    /// ファイルを取り出す
    pub fn take_file(&mut self, name: &str) -> Option<FormFile> {
        self.files.remove(name)
    }

    /// すべてのテキストフィールドを取得 (順序は不定)
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// すべてのファイルを取得 (順序は不定)
    pub fn files(&self) -> impl Iterator<Item = (&str, &FormFile)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// フィールドとファイルの合計数
    pub fn len(&self) -> usize {
        self.fields.len() + self.files.len()
    }

    /// フィールドもファイルもないかどうか
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// テキストフィールドを登録 (同名のファイルは取り除く)
    pub(crate) fn insert_field(&mut self, name: String, value: String) {
        self.files.remove(&name);
        self.fields.insert(name, value);
    }

    /// ファイルを登録 (同名のテキストフィールドは取り除く)
    pub(crate) fn insert_file(&mut self, name: String, file: FormFile) {
        self.fields.remove(&name);
        self.files.insert(name, file);
    }
}

/// リクエストボディから読み取ったファイル
///
/// [`Read`] で先頭から順に内容を読み出せる。
/// 読み取り位置はこのインスタンスが持ち、巻き戻らない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    filename: String,
    content_type: String,
    content: Vec<u8>,
    position: usize,
}

impl FormFile {
    /// 新しい FormFile を作成
    pub fn new(filename: &str, content_type: &str, content: Vec<u8>) -> Self {
        FormFile {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            content,
            position: 0,
        }
    }

    /// 宣言されたファイル名を取得
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Content-Type を取得
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// 内容を取得 (読み取り位置には影響しない)
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// 内容のバイト数
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// 内容が空かどうか
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// 現在の読み取り位置
    pub fn position(&self) -> usize {
        self.position
    }

    /// まだ読み取っていない部分
    pub fn remaining(&self) -> &[u8] {
        &self.content[self.position..]
    }

    /// 内容を取り出す
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

impl Read for FormFile {
    /// 読み取り位置から内容をコピーする。末尾に達していれば `Ok(0)` を返す。
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.remaining().len().min(buf.len());
        buf[..n].copy_from_slice(&self.content[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_in_chunks() {
        let mut file = FormFile::new("file.txt", "text/plain", b"Hello World".to_vec());
        let mut buf = [0u8; 4];

        assert_eq!(file.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"Hell");
        assert_eq!(file.position(), 4);
        assert_eq!(file.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"o Wo");
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"rld");

        // 末尾に達したら 0 を返し続ける
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        assert_eq!(file.position(), 11);
        assert!(file.remaining().is_empty());
        assert_eq!(file.content(), b"Hello World");
    }

    #[test]
    fn test_read_to_end() {
        let mut file = FormFile::new("a.bin", DEFAULT_FILE_CONTENT_TYPE, vec![0, 1, 2, 255]);
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![0, 1, 2, 255]);

        // 2 回目は何も読めない
        out.clear();
        file.read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_read_empty_file() {
        let mut file = FormFile::new("empty", "text/plain", Vec::new());
        let mut buf = [0u8; 8];
        assert!(file.is_empty());
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_cursors_are_independent() {
        let mut a = FormFile::new("a", "text/plain", b"aaaa".to_vec());
        let mut b = a.clone();
        let mut buf = [0u8; 2];

        a.read_exact(&mut buf).unwrap();
        assert_eq!(a.position(), 2);
        assert_eq!(b.position(), 0);
        b.read_exact(&mut buf).unwrap();
        b.read_exact(&mut buf).unwrap();
        assert_eq!(b.position(), 4);
        assert_eq!(a.position(), 2);
    }

    #[test]
    fn test_name_lives_in_one_map() {
        let mut data = FormData::default();
        data.insert_field("x".to_string(), "1".to_string());
        data.insert_file("x".to_string(), FormFile::new("x.txt", "text/plain", b"2".to_vec()));
        assert_eq!(data.get("x"), None);
        assert!(data.file("x").is_some());
        assert_eq!(data.len(), 1);

        data.insert_field("x".to_string(), "3".to_string());
        assert_eq!(data.get("x"), Some("3"));
        assert!(data.file("x").is_none());
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_take_file() {
        let mut data = FormData::default();
        data.insert_file("f".to_string(), FormFile::new("f.txt", "text/plain", b"x".to_vec()));
        let file = data.take_file("f").unwrap();
        assert_eq!(file.into_content(), b"x");
        assert!(data.is_empty());
    }
}
