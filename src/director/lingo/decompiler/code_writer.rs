/// Accumulates decompiled source, indenting each line as it is started.
pub struct CodeWriter {
    buf: String,
    line_ending: String,
    indent_string: String,
    indentation: usize,
    at_line_start: bool,
}

impl CodeWriter {
    pub fn new(line_ending: &str) -> CodeWriter {
        CodeWriter {
            buf: String::new(),
            line_ending: line_ending.to_owned(),
            indent_string: "  ".to_owned(),
            indentation: 0,
            at_line_start: true,
        }
    }

    pub fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indentation {
                self.buf.push_str(&self.indent_string);
            }
            self.at_line_start = false;
        }
        self.buf.push_str(s);
    }

    pub fn write_line(&mut self, s: &str) {
        self.write(s);
        self.end_line();
    }

    pub fn end_line(&mut self) {
        self.buf.push_str(&self.line_ending);
        self.at_line_start = true;
    }

    pub fn indent(&mut self) {
        self.indentation += 1;
    }

    pub fn unindent(&mut self) {
        self.indentation = self.indentation.saturating_sub(1);
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}
